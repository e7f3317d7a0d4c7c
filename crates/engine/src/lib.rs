pub mod clipboard;
pub mod clock;
pub mod edit;
pub mod events;
pub mod fill;
pub mod grid;
pub mod history;
pub mod input;
pub mod memory_store;
pub mod navigation;
pub mod normalize;
pub mod overlay;
pub mod queue;
pub mod session;
pub mod state;
pub mod store;
pub mod window;

mod editing;
mod structure;
mod sync;
mod undo_redo;
mod viewport;

pub use clipboard::{parse_clipboard, serialize_range};
pub use clock::{Clock, ManualClock, RealClock};
pub use edit::EditBuffer;
pub use events::{EventCollector, GridEvent, SubscriptionId};
pub use fill::compute_fill_preview;
pub use grid::{Effect, GridEngine, RowView};
pub use history::{History, HistoryChange, HistoryStep};
pub use input::{parse_key_combo, InputEvent, Key, Modifiers};
pub use memory_store::MemoryStore;
pub use navigation::SelectOptions;
pub use normalize::{normalize, RawValue};
pub use session::{ClipboardPort, GridSession, MemoryClipboard};
pub use store::{Mutation, MutationId, MutationKind, RowPage, RowStore, StoreError};
pub use window::{ChunkKey, FetchRequest, LoadState};
