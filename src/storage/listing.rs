use std::{cmp::Ordering, collections::HashMap};

use serde::Serialize;

use crate::content::{Language, Post, PostStatus};

/// 列表筛选条件
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    pub tag: Option<String>,
    /// 标题、摘要、正文的不区分大小写子串匹配
    pub q: Option<String>,
    pub language: Option<Language>,
}

impl PostFilter {
    /// 公开接口使用的筛选条件，始终只包含已发布文章
    pub fn published() -> Self {
        Self {
            status: Some(PostStatus::Published),
            ..Default::default()
        }
    }

    pub fn tag(mut self, tag: Option<String>) -> Self {
        self.tag = tag.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        self
    }

    pub fn query(mut self, q: Option<String>) -> Self {
        self.q = q.map(|q| q.trim().to_string()).filter(|q| !q.is_empty());
        self
    }

    pub fn language(mut self, language: Option<Language>) -> Self {
        self.language = language;
        self
    }

    pub fn matches(&self, post: &Post) -> bool {
        if self.status.is_some_and(|s| s != post.status) {
            return false;
        }
        if self.language.is_some_and(|l| l != post.language) {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !post.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        if let Some(q) = &self.q {
            let q = q.to_lowercase();
            return [&post.title, &post.summary, &post.content]
                .iter()
                .any(|field| field.to_lowercase().contains(&q));
        }
        true
    }
}

/// 分页参数，页码从 1 开始
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub const DEFAULT_PER_PAGE: u32 = 9;
    pub const MAX_PER_PAGE: u32 = 50;

    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(Self::DEFAULT_PER_PAGE)
                .clamp(1, Self::MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.per_page as u64
    }

    /// 总页数，至少为 1
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.per_page as u64).max(1)
    }

    pub fn into_page(self, posts: Vec<Post>, total: u64) -> PostPage {
        PostPage {
            posts,
            total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages(total),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// 分页结果
#[derive(Debug, Clone, Serialize)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u64,
}

/// 标签及其出现次数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

/// `published_at` 倒序（未发布的排在最后），相同时按 `id` 倒序
pub fn sort_by_published(posts: &mut [Post]) {
    posts.sort_by(|a, b| match (a.published_at, b.published_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| b.id.cmp(&a.id)));
}

/// `created_at` 倒序，相同时按 `id` 倒序
pub fn sort_by_created(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// 统计已发布文章的标签，按次数倒序、标签名正序
pub fn count_tags<'a>(posts: impl IntoIterator<Item = &'a Post>) -> Vec<TagCount> {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for post in posts.into_iter().filter(|p| p.is_published()) {
        for tag in &post.tags {
            *counts.entry(tag.as_str()).or_default() += 1;
        }
    }

    let mut tags: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
        })
        .collect();
    tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    tags
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::content::NewPost;

    fn post(title: &str, tags: &[&str], published: bool) -> Post {
        let mut post = Post::draft(
            NewPost {
                title: title.to_string(),
                summary: format!("{title} summary"),
                content: "Psychometric body".to_string(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                language: Some("en".to_string()),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        if published {
            post.transition(PostStatus::Published, Utc::now());
        }
        post
    }

    #[test]
    fn test_page_request_bounds() {
        let page = PageRequest::new(Some(0), Some(500));
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, PageRequest::MAX_PER_PAGE);

        let page = PageRequest::new(None, Some(9));
        assert_eq!(page.total_pages(20), 3);
        assert_eq!(page.total_pages(18), 2);
        assert_eq!(page.total_pages(0), 1);
        assert_eq!(PageRequest::new(Some(4), Some(9)).offset(), 27);
    }

    #[test]
    fn test_filter_matches() {
        let p = post("GDPR and Assessments", &["GDPR"], true);

        assert!(PostFilter::published().matches(&p));
        assert!(PostFilter::published().tag(Some("GDPR".into())).matches(&p));
        assert!(!PostFilter::published().tag(Some("gdpr".into())).matches(&p));
        assert!(PostFilter::published().query(Some("psychometric".into())).matches(&p));
        assert!(PostFilter::published().query(Some("  ".into())).matches(&p));
        assert!(!PostFilter::published().query(Some("absent".into())).matches(&p));
        assert!(!PostFilter::published().language(Some(Language::Ar)).matches(&p));

        let draft = post("Draft", &[], false);
        assert!(!PostFilter::published().matches(&draft));
        assert!(PostFilter::default().matches(&draft));
    }

    #[test]
    fn test_count_tags_order() {
        let posts = vec![
            post("One", &["AI"], true),
            post("Two", &["AI", "GDPR"], true),
            post("Three", &["GDPR"], true),
            post("Hidden", &["Draft", "AI"], false),
        ];

        assert_eq!(
            count_tags(&posts),
            vec![
                TagCount { tag: "AI".into(), count: 2 },
                TagCount { tag: "GDPR".into(), count: 2 },
            ]
        );
    }

    #[test]
    fn test_sort_by_published() {
        let now = Utc::now();
        let mut a = post("A", &[], false);
        let mut b = post("B", &[], false);
        let mut c = post("C", &[], false);
        a.transition(PostStatus::Published, now - Duration::hours(2));
        b.transition(PostStatus::Published, now);
        c.transition(PostStatus::Published, now);
        let d = post("D", &[], false);

        let mut posts = vec![d.clone(), a.clone(), b.clone(), c.clone()];
        sort_by_published(&mut posts);

        let (first, second) = if b.id > c.id { (&b, &c) } else { (&c, &b) };
        let ids: Vec<_> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec![first.id.as_str(), second.id.as_str(), a.id.as_str(), d.id.as_str()]);
    }

    #[test]
    fn test_sort_by_created() {
        let now = Utc::now();
        let mut old = post("Old", &[], true);
        let mut x = post("X", &[], false);
        let mut y = post("Y", &[], false);
        old.created_at = now - Duration::days(1);
        x.created_at = now;
        y.created_at = now;

        let mut posts = vec![old.clone(), x.clone(), y.clone()];
        sort_by_created(&mut posts);

        let (first, second) = if x.id > y.id { (&x, &y) } else { (&y, &x) };
        let ids: Vec<_> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec![first.id.as_str(), second.id.as_str(), old.id.as_str()]);
    }
}
