pub mod annotation;
pub mod job;
pub mod platform;
pub mod project;
pub mod quota;
pub mod session;
pub mod usage;

pub use annotation::Comment;
pub use job::{DataItem, Job, JobDraft, JobStatus, JobUpdate, RemoveMode};
pub use platform::{PlatformName, PlatformTable};
pub use project::{Project, ProjectDraft, ProjectStatus, ProjectUpdate};
pub use quota::{Quota, QuotaUpdate};
pub use session::{Session, SessionDraft, SessionStatus};
pub use usage::ResourceUsage;
