use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    ContactStore, PageRequest, PostFilter, PostPage, PostStore, TagCount, Transition, count_tags,
    sort_by_created, sort_by_published,
};
use crate::{
    content::{Contact, NewPost, Post, PostPatch, PostStatus},
    error::{Error, Result},
};

#[derive(Default)]
struct Posts {
    by_id: HashMap<String, Post>,
    /// slug -> id
    slugs: HashMap<String, String>,
}

/// 进程内存储
///
/// 写操作在整个读-改-写过程中持有写锁，同一篇文章的并发写入因此被串行化。
#[derive(Default)]
pub struct MemoryStore {
    posts: RwLock<Posts>,
    contacts: RwLock<Vec<Contact>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn create(&self, new: NewPost) -> Result<Post> {
        let post = Post::draft(new, Utc::now())?;

        let mut posts = self.posts.write().await;
        if posts.slugs.contains_key(&post.slug) {
            return Err(Error::Conflict(format!("slug `{}` already exists", post.slug)));
        }
        posts.slugs.insert(post.slug.clone(), post.id.clone());
        posts.by_id.insert(post.id.clone(), post.clone());

        Ok(post)
    }

    async fn get(&self, id: &str) -> Result<Post> {
        self.posts
            .read()
            .await
            .by_id
            .get(id)
            .cloned()
            .ok_or(Error::NotFound)
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Post> {
        let posts = self.posts.read().await;
        posts
            .slugs
            .get(slug)
            .and_then(|id| posts.by_id.get(id))
            .cloned()
            .ok_or(Error::NotFound)
    }

    async fn update(&self, id: &str, patch: PostPatch) -> Result<Post> {
        let mut posts = self.posts.write().await;
        let current = posts.by_id.get_mut(id).ok_or(Error::NotFound)?;

        let updated = current.patched(patch, Utc::now())?;
        *current = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut posts = self.posts.write().await;
        let removed = posts.by_id.remove(id).ok_or(Error::NotFound)?;
        posts.slugs.remove(&removed.slug);
        Ok(())
    }

    async fn set_status(&self, id: &str, status: PostStatus) -> Result<Transition> {
        let mut posts = self.posts.write().await;
        let post = posts.by_id.get_mut(id).ok_or(Error::NotFound)?;

        let changed = post.transition(status, Utc::now());
        Ok(Transition {
            post: post.clone(),
            changed,
        })
    }

    async fn list(&self, filter: &PostFilter, page: PageRequest) -> Result<PostPage> {
        let mut matched: Vec<Post> = self
            .posts
            .read()
            .await
            .by_id
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        sort_by_published(&mut matched);

        let total = matched.len() as u64;
        let posts = matched
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.per_page as usize)
            .collect();

        Ok(page.into_page(posts, total))
    }

    async fn list_all(&self) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = self.posts.read().await.by_id.values().cloned().collect();
        sort_by_created(&mut posts);
        Ok(posts)
    }

    async fn list_tags(&self) -> Result<Vec<TagCount>> {
        Ok(count_tags(self.posts.read().await.by_id.values()))
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn save_contact(&self, contact: &Contact) -> Result<()> {
        self.contacts.write().await.push(contact.clone());
        Ok(())
    }

    async fn contacts(&self) -> Result<Vec<Contact>> {
        let mut contacts = self.contacts.read().await.clone();
        contacts.reverse();
        Ok(contacts)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::content::Language;

    fn new_post(title: &str, tags: &[&str]) -> NewPost {
        NewPost {
            title: title.to_string(),
            summary: "A summary".to_string(),
            content: "Some markdown content".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            language: Some("en".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = MemoryStore::new();
        let created = store.create(new_post("First Post", &["AI"])).await.unwrap();

        let fetched = store.get(&created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.status, PostStatus::Draft);
        assert!(fetched.published_at.is_none());
        assert_eq!(store.get_by_slug("first-post").await.unwrap().id, created.id);
    }

    #[tokio::test]
    async fn test_slug_conflict() {
        let store = MemoryStore::new();
        store.create(new_post("Same Title", &[])).await.unwrap();
        let err = store.create(new_post("Same   Title!", &[])).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_missing_records() {
        let store = MemoryStore::new();
        assert!(matches!(store.get("nope").await, Err(Error::NotFound)));
        assert!(matches!(
            store.update("nope", PostPatch::default()).await,
            Err(Error::NotFound)
        ));
        assert!(matches!(
            store.set_status("nope", PostStatus::Published).await,
            Err(Error::NotFound)
        ));
        assert!(matches!(store.delete("nope").await, Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_is_terminal() {
        let store = MemoryStore::new();
        let post = store.create(new_post("Gone", &[])).await.unwrap();
        store.set_status(&post.id, PostStatus::Published).await.unwrap();

        store.delete(&post.id).await.unwrap();
        assert!(matches!(store.get(&post.id).await, Err(Error::NotFound)));
        assert!(matches!(store.get_by_slug("gone").await, Err(Error::NotFound)));
        assert!(matches!(store.delete(&post.id).await, Err(Error::NotFound)));

        // slug 可被重新使用
        store.create(new_post("Gone", &[])).await.unwrap();
    }

    #[tokio::test]
    async fn test_pagination() {
        let store = MemoryStore::new();
        for i in 0..20 {
            let post = store.create(new_post(&format!("Post {i}"), &[])).await.unwrap();
            store.set_status(&post.id, PostStatus::Published).await.unwrap();
        }
        store.create(new_post("Unpublished", &[])).await.unwrap();

        let filter = PostFilter::published();
        let first = store.list(&filter, PageRequest::new(Some(1), Some(9))).await.unwrap();
        assert_eq!(first.total, 20);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.posts.len(), 9);

        let third = store.list(&filter, PageRequest::new(Some(3), Some(9))).await.unwrap();
        assert_eq!(third.posts.len(), 2);

        let fourth = store.list(&filter, PageRequest::new(Some(4), Some(9))).await.unwrap();
        assert!(fourth.posts.is_empty());
        assert_eq!(fourth.total_pages, 3);

        let none = store
            .list(
                &PostFilter::published().language(Some(Language::Tr)),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(none.total, 0);
        assert_eq!(none.total_pages, 1);
    }

    #[tokio::test]
    async fn test_list_tags_only_published() {
        let store = MemoryStore::new();
        for (title, tags) in [("A", &["AI"][..]), ("B", &["AI", "GDPR"][..]), ("C", &["GDPR"][..])] {
            let post = store.create(new_post(title, tags)).await.unwrap();
            store.set_status(&post.id, PostStatus::Published).await.unwrap();
        }
        store.create(new_post("D", &["Ethics"])).await.unwrap();

        let tags = store.list_tags().await.unwrap();
        let tags: Vec<_> = tags.iter().map(|t| (t.tag.as_str(), t.count)).collect();
        assert_eq!(tags, vec![("AI", 2), ("GDPR", 2)]);
    }

    #[tokio::test]
    async fn test_list_all_newest_first() {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for title in ["Oldest", "Middle", "Newest"] {
            let post = store.create(new_post(title, &[])).await.unwrap();
            ids.push(post.id);
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        // 发布状态不影响管理列表的顺序
        store.set_status(&ids[0], PostStatus::Published).await.unwrap();

        let listed: Vec<_> = store.list_all().await.unwrap().into_iter().map(|p| p.id).collect();
        ids.reverse();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_serialized() {
        let store = Arc::new(MemoryStore::new());
        let post = store.create(new_post("Counter", &[])).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            let id = post.id.clone();
            handles.push(tokio::spawn(async move {
                let started = Utc::now();
                let patch = PostPatch {
                    tags: Some(vec![format!("t{i}")]),
                    ..Default::default()
                };
                let updated = store.update(&id, patch).await.unwrap();
                store.set_status(&id, PostStatus::Published).await.unwrap();
                (started, updated)
            }));
        }
        let mut results = Vec::new();
        for h in handles {
            results.push(h.await.unwrap());
        }

        let post = store.get(&post.id).await.unwrap();
        assert!(post.is_published());
        assert!(post.published_at.is_some());

        // 每次写入都基于前一次的完整结果：最终值来自最后一次更新，且晚于所有写入开始的时间
        let last = results
            .iter()
            .map(|(_, updated)| updated)
            .max_by_key(|updated| updated.updated_at)
            .unwrap();
        assert_eq!(post.tags, last.tags);
        assert!((0..16).any(|i| post.tags == vec![format!("t{i}")]));
        for (started, _) in &results {
            assert!(post.updated_at >= *started);
        }
    }

    #[tokio::test]
    async fn test_contacts_newest_first() {
        let store = MemoryStore::new();
        for name in ["First Person", "Second Person"] {
            let contact = Contact::submit(
                crate::content::NewContact {
                    name: name.to_string(),
                    email: "a@b.io".to_string(),
                    company_type: "other".to_string(),
                    message: "Please contact me soon.".to_string(),
                    ..Default::default()
                },
                Utc::now(),
            )
            .unwrap();
            store.save_contact(&contact).await.unwrap();
        }
        let contacts = store.contacts().await.unwrap();
        assert_eq!(contacts[0].name, "Second Person");
    }
}
