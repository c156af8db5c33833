pub mod account;
pub mod bootstrap_staff;
pub mod category;
pub mod comment;
pub mod favorite;
pub mod like;
pub mod post;
pub mod profile;
pub mod upload;
pub mod view;
