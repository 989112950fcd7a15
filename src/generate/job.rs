use crate::{
    app::App,
    content::{Post, derive_slug, parse_generated},
    error::{Error, Result},
};

/// 执行一次生成任务
///
/// 调用生成服务，解析返回的文档并创建 `ai_generated` 草稿；
/// 开启自动发布时随即发布（会触发发布通知）。
/// 标题生成的 slug 已存在时追加一段随机后缀重试一次。
pub async fn run_job(app: App) -> Result<Post> {
    let generator = app
        .generator()
        .ok_or_else(|| Error::Config("generator not configured".to_string()))?;

    let language = app.generate_language();
    let document = generator.generate(language).await?;
    let new = parse_generated(&document, language)?;

    let post = match app.posts().create(new.clone()).await {
        Err(Error::Conflict(_)) => {
            let suffix = uuid::Uuid::new_v4().simple().to_string();
            let mut retry = new;
            retry.slug = Some(format!(
                "{}-{}",
                derive_slug(&retry.title, &suffix),
                &suffix[..6]
            ));
            app.posts().create(retry).await?
        }
        other => other?,
    };
    tracing::info!(id = %post.id, slug = %post.slug, "generated post created");

    if app.auto_publish() {
        return app.publish(&post.id).await;
    }
    Ok(post)
}

/// 后台执行生成任务，立即返回
pub fn spawn_job(app: App) {
    tokio::spawn(async move {
        if let Err(e) = run_job(app).await {
            tracing::error!(%e, "ai post generation failed");
        }
    });
}
