pub mod commands;
pub mod dock;
pub mod export;
pub mod hit;
pub mod input;
pub mod session;
pub mod store;
pub mod sync;
pub mod tools;

pub use commands::CommandStack;
pub use export::{ExportPayload, export_schema};
pub use hit::{HitTarget, hit_test};
pub use input::{Button, InputEvent, Modifiers};
pub use session::{EditorSession, Selection};
pub use store::{AuthProvider, DiagramId, DiagramStore, MemoryStore, Role, StoreError, UserId};
pub use sync::{Notation, SETTLE_DELAY_MS, SyncEngine, SyncError, SyncState};
pub use tools::{Interaction, InteractionController};
