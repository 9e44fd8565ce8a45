//! Admin maintenance endpoints.
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/api/admin/storage/reconcile` | Relocate files stranded under the pending prefix |

pub mod handlers;
pub mod routes;
