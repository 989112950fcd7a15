mod listing;
mod memory;
mod postgres;

use async_trait::async_trait;

use crate::{
    content::{Contact, NewPost, Post, PostPatch, PostStatus},
    error::Result,
};

pub use self::{
    listing::{
        PageRequest, PostFilter, PostPage, TagCount, count_tags, sort_by_created,
        sort_by_published,
    },
    memory::MemoryStore,
    postgres::PgStore,
};

/// 状态切换结果
///
/// `changed` 为 `false` 表示文章原本就处于目标状态。
#[derive(Debug, Clone)]
pub struct Transition {
    pub post: Post,
    pub changed: bool,
}

/// 文章存储接口
///
/// 接口层只依赖该 trait，存储后端可以替换（[`MemoryStore`]、[`PgStore`]）。
/// 同一篇文章的写操作由实现方串行化。
#[async_trait]
pub trait PostStore: Send + Sync {
    /// 创建草稿；slug 冲突时返回 [`crate::error::Error::Conflict`]
    async fn create(&self, new: NewPost) -> Result<Post>;

    async fn get(&self, id: &str) -> Result<Post>;

    /// 按 slug 查询，不区分状态；公开接口需自行过滤草稿
    async fn get_by_slug(&self, slug: &str) -> Result<Post>;

    async fn update(&self, id: &str, patch: PostPatch) -> Result<Post>;

    async fn delete(&self, id: &str) -> Result<()>;

    async fn set_status(&self, id: &str, status: PostStatus) -> Result<Transition>;

    /// 条件筛选 + 分页，按 `published_at` 倒序，`id` 倒序
    async fn list(&self, filter: &PostFilter, page: PageRequest) -> Result<PostPage>;

    /// 所有文章（含草稿），按 `created_at` 倒序
    async fn list_all(&self) -> Result<Vec<Post>>;

    /// 已发布文章的标签统计
    async fn list_tags(&self) -> Result<Vec<TagCount>>;
}

/// 联系请求存储接口
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn save_contact(&self, contact: &Contact) -> Result<()>;

    /// 所有联系请求，最新的在前
    async fn contacts(&self) -> Result<Vec<Contact>>;
}
