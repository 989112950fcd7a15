use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder, postgres::PgPoolOptions, types::Json};

use super::{ContactStore, PageRequest, PostFilter, PostPage, PostStore, TagCount, Transition};
use crate::{
    content::{Contact, NewPost, Post, PostPatch, PostStatus, Seo},
    error::{Error, Result},
};

/// 数据库连接池类型
type Db = sqlx::PgPool;

const SCHEMA: &str = include_str!("../../sql/01-CREATE_TABLE.sql");

const POST_COLUMNS: &str = "id, slug, title, summary, content, tags, language, hero_image, seo, \
     status, ai_generated, created_at, updated_at, published_at";

/// 数据库中的文章行
#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: String,
    slug: String,
    title: String,
    summary: String,
    content: String,
    tags: Vec<String>,
    language: String,
    hero_image: Option<String>,
    seo: Option<Json<Seo>>,
    status: String,
    ai_generated: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    published_at: Option<DateTime<Utc>>,
}

impl TryFrom<PostRow> for Post {
    type Error = Error;

    fn try_from(row: PostRow) -> Result<Post> {
        Ok(Post {
            id: row.id,
            slug: row.slug,
            title: row.title,
            summary: row.summary,
            content: row.content,
            tags: row.tags,
            language: row.language.parse()?,
            hero_image: row.hero_image,
            seo: row.seo.map(|Json(seo)| seo),
            status: row.status.parse()?,
            ai_generated: row.ai_generated,
            created_at: row.created_at,
            updated_at: row.updated_at,
            published_at: row.published_at,
        })
    }
}

fn into_posts(rows: Vec<PostRow>) -> Result<Vec<Post>> {
    rows.into_iter().map(Post::try_from).collect()
}

/// Postgres 存储
///
/// `update` 与 `set_status` 在事务中以 `SELECT ... FOR UPDATE` 锁定目标行。
#[derive(Clone)]
pub struct PgStore {
    db: Db,
}

impl PgStore {
    pub fn new(db: sqlx::PgPool) -> Self {
        Self { db }
    }

    /// 连接数据库并确保表结构存在
    ///
    /// 连接池配置：
    ///
    /// - 最大空闲时间 60 秒
    /// - 最大生存时间 1500 秒（约 25 分钟）
    /// - 最大连接数 10
    /// - 获取连接超时 2 秒
    /// - 获取前测试连接
    /// - 最小连接数 2
    pub async fn connect(conn_url: &str) -> Result<Self> {
        let db = PgPoolOptions::new()
            .idle_timeout(Duration::from_secs(60))
            .max_lifetime(Duration::from_secs(1500))
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(2))
            .test_before_acquire(true)
            .min_connections(2)
            .connect(conn_url)
            .await?;

        let store = Self::new(db);
        store.migrate().await?;
        Ok(store)
    }

    /// 执行建表语句
    ///
    /// 按 `;` 分割，每条 SQL 单独执行
    pub async fn migrate(&self) -> Result<()> {
        for sql in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(sql).execute(&self.db).await?;
        }
        Ok(())
    }

    async fn save(executor: &mut sqlx::PgConnection, post: &Post) -> Result<()> {
        sqlx::query(
            "
            UPDATE posts SET
                title = $2,
                summary = $3,
                content = $4,
                tags = $5,
                language = $6,
                hero_image = $7,
                seo = $8,
                status = $9,
                updated_at = $10,
                published_at = $11
            WHERE id = $1
            ",
        )
        .bind(&post.id)
        .bind(&post.title)
        .bind(&post.summary)
        .bind(&post.content)
        .bind(&post.tags)
        .bind(post.language.as_str())
        .bind(&post.hero_image)
        .bind(post.seo.as_ref().map(Json))
        .bind(post.status.as_str())
        .bind(post.updated_at)
        .bind(post.published_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    async fn lock(executor: &mut sqlx::PgConnection, id: &str) -> Result<Post> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(Error::NotFound)?;
        row.try_into()
    }
}

/// 把筛选条件追加到 `WHERE` 子句
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    builder.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(language) = filter.language {
        builder.push(" AND language = ").push_bind(language.as_str());
    }
    if let Some(tag) = &filter.tag {
        builder.push(" AND ").push_bind(tag.clone()).push(" = ANY(tags)");
    }
    if let Some(q) = &filter.q {
        let pattern = format!("%{}%", escape_like(q));
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR summary ILIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR content ILIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl PostStore for PgStore {
    async fn create(&self, new: NewPost) -> Result<Post> {
        let post = Post::draft(new, Utc::now())?;

        let result = sqlx::query(
            "
            INSERT INTO posts
                (id, slug, title, summary, content, tags, language, hero_image, seo,
                 status, ai_generated, created_at, updated_at, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ",
        )
        .bind(&post.id)
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.summary)
        .bind(&post.content)
        .bind(&post.tags)
        .bind(post.language.as_str())
        .bind(&post.hero_image)
        .bind(post.seo.as_ref().map(Json))
        .bind(post.status.as_str())
        .bind(post.ai_generated)
        .bind(post.created_at)
        .bind(post.updated_at)
        .bind(post.published_at)
        .execute(&self.db)
        .await;

        match result {
            Ok(_) => Ok(post),
            Err(e) if is_unique_violation(&e) => {
                Err(Error::Conflict(format!("slug `{}` already exists", post.slug)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: &str) -> Result<Post> {
        sqlx::query_as::<_, PostRow>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(Error::NotFound)?
            .try_into()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Post> {
        sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.db)
        .await?
        .ok_or(Error::NotFound)?
        .try_into()
    }

    async fn update(&self, id: &str, patch: PostPatch) -> Result<Post> {
        let mut tx = self.db.begin().await?;

        let current = Self::lock(&mut tx, id).await?;
        let updated = current.patched(patch, Utc::now())?;
        Self::save(&mut tx, &updated).await?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    async fn set_status(&self, id: &str, status: PostStatus) -> Result<Transition> {
        let mut tx = self.db.begin().await?;

        let mut post = Self::lock(&mut tx, id).await?;
        let changed = post.transition(status, Utc::now());
        if changed {
            Self::save(&mut tx, &post).await?;
        }

        tx.commit().await?;
        Ok(Transition { post, changed })
    }

    async fn list(&self, filter: &PostFilter, page: PageRequest) -> Result<PostPage> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.db).await?;

        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {POST_COLUMNS} FROM posts"));
        push_filters(&mut builder, filter);
        builder.push(" ORDER BY published_at DESC NULLS LAST, id DESC");
        builder.push(" LIMIT ").push_bind(page.per_page as i64);
        builder.push(" OFFSET ").push_bind(page.offset() as i64);

        let rows = builder
            .build_query_as::<PostRow>()
            .fetch_all(&self.db)
            .await?;

        Ok(page.into_page(into_posts(rows)?, total.max(0) as u64))
    }

    async fn list_all(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.db)
        .await?;
        into_posts(rows)
    }

    async fn list_tags(&self) -> Result<Vec<TagCount>> {
        Ok(sqlx::query_as::<_, TagCount>(
            r#"
            SELECT tag, COUNT(*) AS count
            FROM posts, UNNEST(tags) AS tag
            WHERE status = 'published'
            GROUP BY tag
            ORDER BY count DESC, tag ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?)
    }
}

#[async_trait]
impl ContactStore for PgStore {
    async fn save_contact(&self, contact: &Contact) -> Result<()> {
        sqlx::query(
            "
            INSERT INTO contact_submissions
                (id, name, email, phone, company, company_type, message, created_at, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(&contact.id)
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.company)
        .bind(&contact.company_type)
        .bind(&contact.message)
        .bind(contact.created_at)
        .bind(&contact.status)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn contacts(&self) -> Result<Vec<Contact>> {
        Ok(sqlx::query_as::<_, Contact>(
            "SELECT * FROM contact_submissions ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.db)
        .await?)
    }
}
