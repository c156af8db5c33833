//! Response shapes.
//!
//! Everything here is a pure mapping from stored rows plus the request base
//! URL to a serializable view-model. Absent media and absent categories are
//! rendered as the literal string `"null"`, not as JSON null; clients depend
//! on that.

pub mod category;
pub mod comment;
pub mod format;
pub mod post;
pub mod profile;

pub use category::CategoryDetail;
pub use comment::{comment_detail, CommentDetail};
pub use format::{format_timestamp, media_url, OrNull};
pub use post::{post_detail, AuthorSummary, PostDetail};
pub use profile::{profile_detail, ProfileDetail, UserSummary};
