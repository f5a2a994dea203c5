//! Named, ordered pipelines of states backed by a set store.
//!
//! Items are registered into the implicit `collector` state and moved
//! through the configured states by workers. Each `(item id, state)` pair
//! owns one set in the store, addressed by a key of the form
//! `rpipe:group:<group>:id:<id>:state:<state>:<suffix>`.

pub mod codec;
pub mod key_codec;
pub mod options;
pub mod pipeline;
pub mod state_machine;

pub use codec::{ActionCodec, JsonCodec};
pub use key_codec::KeyCodec;
pub use options::PipelineOptions;
pub use pipeline::Pipeline;
pub use shared::{
    domain::{MoveReport, ParsedKey},
    error::{ErrorCode, PipelineError, Result},
    protocol::{Action, Message, Receiver},
};
pub use state_machine::{StateMachine, COLLECTOR};
pub use storage::{MemoryStore, SetStore, SqliteSetStore};
