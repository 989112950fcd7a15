use serde::Deserialize;

use super::{Language, NewPost, Seo};
use crate::error::{Error, Result};

/// 生成服务返回的 YAML Front Matter
#[derive(Debug, Deserialize)]
pub struct FrontMatter {
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub language: Option<String>,
    pub hero_image: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

/// 将生成服务输出的 Markdown 文档转换为 [`NewPost`]
///
/// 文档需以 `---` 包裹的 YAML Front Matter 开头，其后为正文。
/// Front Matter 未指定语言时使用 `fallback`。结果带有 `ai_generated` 标记。
pub fn parse_generated(document: &str, fallback: Language) -> Result<NewPost> {
    let (yaml_str, body) = extract_front_matter_and_body(document)?;
    let front_matter: FrontMatter = serde_yaml::from_str(yaml_str)?;

    let seo = (front_matter.seo_title.is_some() || front_matter.seo_description.is_some()).then(
        || Seo {
            meta_title: front_matter.seo_title,
            meta_description: front_matter.seo_description,
        },
    );

    Ok(NewPost {
        title: front_matter.title,
        summary: front_matter.summary,
        content: body.to_string(),
        slug: None,
        tags: front_matter.tags,
        language: Some(
            front_matter
                .language
                .unwrap_or_else(|| fallback.as_str().to_string()),
        ),
        hero_image: front_matter.hero_image,
        seo,
        ai_generated: true,
    })
}

fn extract_front_matter_and_body(content: &str) -> Result<(&str, &str)> {
    const DELIM: &str = "---";

    let content = content.trim_start();

    if !content.starts_with(DELIM) {
        return Err(Error::FrontMatter("Missing required YAML front matter"));
    }

    let rest = &content[DELIM.len()..];
    let end_pos = rest.find(DELIM).ok_or(Error::FrontMatter(
        "Front matter does not terminate with expected delimiter ---",
    ))?;

    let yaml_str = &rest[..end_pos];
    let body_str = rest[end_pos + DELIM.len()..].trim();

    Ok((yaml_str.trim(), body_str))
}
