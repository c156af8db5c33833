pub mod category;
pub mod comment;
pub mod favorite;
pub mod post;
pub mod post_like;
pub mod post_view;
pub mod profile;
pub mod user;

pub use category::{Entity as Category, Model as CategoryModel};
pub use comment::{Entity as Comment, Model as CommentModel};
pub use favorite::Entity as Favorite;
pub use post::{Entity as Post, Model as PostModel};
pub use post_like::Entity as PostLike;
pub use post_view::Entity as PostView;
pub use profile::{Entity as Profile, Model as ProfileModel};
pub use user::{Entity as User, Model as UserModel};
