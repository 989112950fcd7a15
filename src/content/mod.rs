mod contact;
mod generated;
mod post;

pub use self::{
    contact::{Contact, NewContact},
    generated::{FrontMatter, parse_generated},
    post::{Language, NewPost, Post, PostPatch, PostStatus, Seo, derive_slug, normalize_tags},
};
