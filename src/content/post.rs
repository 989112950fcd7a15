use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use slug::slugify;

use crate::error::{Error, Result};

/// 文章状态
///
/// 只有 [`PostStatus::Published`] 的文章会出现在公开接口中。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl FromStr for PostStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(Error::validation("status", format!("unknown status `{other}`"))),
        }
    }
}

/// 站点支持的语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Nl,
    De,
    Fr,
    Fa,
    Ar,
    Tr,
}

impl Language {
    pub const ALL: [Language; 7] = [
        Language::En,
        Language::Nl,
        Language::De,
        Language::Fr,
        Language::Fa,
        Language::Ar,
        Language::Tr,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Nl => "nl",
            Language::De => "de",
            Language::Fr => "fr",
            Language::Fa => "fa",
            Language::Ar => "ar",
            Language::Tr => "tr",
        }
    }

    /// 从右到左书写的语言
    pub fn is_rtl(&self) -> bool {
        matches!(self, Language::Fa | Language::Ar)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim().to_ascii_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str() == code)
            .ok_or_else(|| Error::validation("language", format!("unsupported language `{s}`")))
    }
}

/// SEO 覆盖字段
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Seo {
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

impl Seo {
    /// 去掉空白字段；两个字段都为空时返回 `None`
    fn normalize(self) -> Option<Seo> {
        let seo = Seo {
            meta_title: non_blank(self.meta_title),
            meta_description: non_blank(self.meta_description),
        };
        (seo.meta_title.is_some() || seo.meta_description.is_some()).then_some(seo)
    }
}

/// 博客文章
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub tags: Vec<String>,
    pub language: Language,
    pub hero_image: Option<String>,
    pub seo: Option<Seo>,
    pub status: PostStatus,
    pub ai_generated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

/// 创建文章的请求体
///
/// 字段全部可缺省，缺失的必填字段由 [`Post::draft`] 统一报告为校验错误。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewPost {
    pub title: String,
    pub summary: String,
    pub content: String,
    pub slug: Option<String>,
    pub tags: Vec<String>,
    pub language: Option<String>,
    pub hero_image: Option<String>,
    pub seo: Option<Seo>,
    #[serde(skip)]
    pub ai_generated: bool,
}

/// 更新文章的请求体，`None` 表示保持原值
///
/// `hero_image` 与 `seo` 显式传 `null` 时清空。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub language: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub hero_image: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub seo: Option<Option<Seo>>,
}

fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl Post {
    /// 根据 [`NewPost`] 构建一篇草稿
    ///
    /// 分配 `id`，设置 `created_at`，校验必填字段并确定 `slug`。
    pub fn draft(new: NewPost, now: DateTime<Utc>) -> Result<Post> {
        let id = uuid::Uuid::new_v4().to_string();

        let title = required("title", new.title)?;
        let summary = required("summary", new.summary)?;
        let content = required("content", new.content)?;
        let language = match new.language.as_deref().map(str::trim) {
            None | Some("") => return Err(Error::validation("language", "field required")),
            Some(code) => code.parse::<Language>()?,
        };

        let slug = match non_blank(new.slug) {
            Some(slug) => explicit_slug(slug)?,
            None => derive_slug(&title, &id),
        };

        Ok(Post {
            id,
            slug,
            title,
            summary,
            content,
            tags: normalize_tags(new.tags),
            language,
            hero_image: non_blank(new.hero_image),
            seo: new.seo.and_then(Seo::normalize),
            status: PostStatus::Draft,
            ai_generated: new.ai_generated,
            created_at: now,
            updated_at: now,
            published_at: None,
        })
    }

    /// 合并 [`PostPatch`]，返回合并后的新文章
    ///
    /// `slug` 在创建后不再变化。
    pub fn patched(&self, patch: PostPatch, now: DateTime<Utc>) -> Result<Post> {
        let mut post = self.clone();

        if let Some(title) = patch.title {
            post.title = required("title", title)?;
        }
        if let Some(summary) = patch.summary {
            post.summary = required("summary", summary)?;
        }
        if let Some(content) = patch.content {
            post.content = required("content", content)?;
        }
        if let Some(tags) = patch.tags {
            post.tags = normalize_tags(tags);
        }
        if let Some(language) = patch.language {
            post.language = language.parse()?;
        }
        if let Some(hero_image) = patch.hero_image {
            post.hero_image = non_blank(hero_image);
        }
        if let Some(seo) = patch.seo {
            post.seo = seo.and_then(Seo::normalize);
        }

        post.updated_at = now;
        Ok(post)
    }

    /// 切换状态
    ///
    /// 发布时写入 `published_at`，撤回时清空。状态未变化时不做任何修改并返回 `false`。
    pub fn transition(&mut self, status: PostStatus, now: DateTime<Utc>) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        self.published_at = match status {
            PostStatus::Published => Some(now),
            PostStatus::Draft => None,
        };
        self.updated_at = now;
        true
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(field: &'static str, value: String) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::validation(field, "field required"));
    }
    Ok(value.to_string())
}

/// 去除空白标签与重复标签，保留首次出现的顺序
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// 由标题生成 slug
///
/// 标题中没有可转写字符时（例如纯符号），退化为 `post-<id 前 8 位>`。
pub fn derive_slug(title: &str, id: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        format!("post-{}", &id[..id.len().min(8)])
    } else {
        slug
    }
}

fn explicit_slug(slug: String) -> Result<String> {
    if slugify(&slug) != slug {
        return Err(Error::validation(
            "slug",
            format!("`{slug}` is not a url-safe slug"),
        ));
    }
    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_post(title: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            summary: "Short summary".to_string(),
            content: "# Heading\n\nBody".to_string(),
            tags: vec!["AI".to_string(), " GDPR ".to_string(), "AI".to_string(), "".to_string()],
            language: Some("en".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_draft_assigns_defaults() {
        let now = Utc::now();
        let post = Post::draft(new_post("Hello World: AI & Ethics"), now).expect("valid post");

        assert_eq!(post.slug, "hello-world-ai-ethics");
        assert_eq!(post.status, PostStatus::Draft);
        assert!(post.published_at.is_none());
        assert_eq!(post.created_at, now);
        assert_eq!(post.tags, vec!["AI", "GDPR"]);
        assert!(!post.ai_generated);
    }

    #[test]
    fn test_draft_missing_fields() {
        let mut new = new_post("Title");
        new.summary = "   ".to_string();
        let err = Post::draft(new, Utc::now()).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "summary", .. }));

        let mut new = new_post("Title");
        new.language = None;
        let err = Post::draft(new, Utc::now()).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "language", .. }));

        let mut new = new_post("Title");
        new.language = Some("xx".to_string());
        let err = Post::draft(new, Utc::now()).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "language", .. }));
    }

    #[test]
    fn test_slug_fallback_and_explicit() {
        let post = Post::draft(new_post("???"), Utc::now()).unwrap();
        assert!(post.slug.starts_with("post-"));
        assert_eq!(post.slug, format!("post-{}", &post.id[..8]));

        let mut new = new_post("Anything");
        new.slug = Some("custom-slug".to_string());
        assert_eq!(Post::draft(new, Utc::now()).unwrap().slug, "custom-slug");

        let mut new = new_post("Anything");
        new.slug = Some("Not A Slug".to_string());
        assert!(Post::draft(new, Utc::now()).is_err());
    }

    #[test]
    fn test_patch_merges_and_keeps_slug() {
        let post = Post::draft(new_post("Original"), Utc::now()).unwrap();
        let patch: PostPatch = serde_json::from_value(serde_json::json!({
            "title": "Renamed",
            "language": "fa",
            "hero_image": "https://img.example/x.png",
            "seo": { "meta_title": "Meta", "meta_description": "" }
        }))
        .unwrap();

        let patched = post.patched(patch, Utc::now()).unwrap();
        assert_eq!(patched.title, "Renamed");
        assert_eq!(patched.slug, "original");
        assert_eq!(patched.language, Language::Fa);
        assert!(patched.language.is_rtl());
        assert_eq!(patched.hero_image.as_deref(), Some("https://img.example/x.png"));
        assert_eq!(
            patched.seo,
            Some(Seo {
                meta_title: Some("Meta".to_string()),
                meta_description: None
            })
        );

        let clear: PostPatch =
            serde_json::from_value(serde_json::json!({ "hero_image": null })).unwrap();
        let cleared = patched.patched(clear, Utc::now()).unwrap();
        assert!(cleared.hero_image.is_none());
        assert!(cleared.seo.is_some());
    }

    #[test]
    fn test_patch_rejects_blank_required() {
        let post = Post::draft(new_post("Original"), Utc::now()).unwrap();
        let patch = PostPatch {
            content: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            post.patched(patch, Utc::now()),
            Err(Error::Validation { field: "content", .. })
        ));
    }

    #[test]
    fn test_transition_policy() {
        let mut post = Post::draft(new_post("Lifecycle"), Utc::now()).unwrap();
        let first = Utc::now();

        assert!(post.transition(PostStatus::Published, first));
        assert_eq!(post.published_at, Some(first));

        // 重复发布不会改写发布时间
        assert!(!post.transition(PostStatus::Published, first + chrono::Duration::hours(1)));
        assert_eq!(post.published_at, Some(first));

        assert!(post.transition(PostStatus::Draft, Utc::now()));
        assert!(post.published_at.is_none());
        assert!(!post.transition(PostStatus::Draft, Utc::now()));
    }
}
