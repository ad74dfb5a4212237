// ============================================================================
// STATE MODULE - State Management con Rc<RefCell> + notificaciones
// ============================================================================

pub mod reactivity;
pub mod sync_state;

pub use reactivity::*;
pub use sync_state::*;
