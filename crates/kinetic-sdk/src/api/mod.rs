//! Component API implementations.

mod agent;
mod collection;
mod core;
mod discussions;
mod filehub;
mod integrator;
mod subscription;
mod task;

pub use agent::AgentApi;
pub use collection::Collection;
pub use self::core::{AttributeScope, CoreApi, SPACE_EXPORT_SHAPE, SubmissionsApi};
pub use discussions::{DiscussionsApi, InvitationsApi, MessagesApi, RelatedItemsApi};
pub use filehub::FilehubApi;
pub use integrator::IntegratorApi;
pub use subscription::{DiscussionEvent, socket_url};
pub use task::{EngineApi, HandlersApi, TaskApi, TreesApi, tree_export_path};
