use std::{sync::Arc, time::Duration};

use crate::{
    config::Config,
    content::{Contact, Language, NewContact, Post, PostStatus},
    error::Result,
    generate::{Generator, HttpGenerator, Scheduler, SchedulerStatus},
    notify::{ContactNotifier, PublishHook, ResendMailer, WebhookNotifier},
    storage::{ContactStore, MemoryStore, PgStore, PostStore},
};

/// 应用程序上下文
///
/// [`App`] 封装了存储、外部通知、生成服务和后台调度器，作为 axum 的共享状态。
#[derive(Clone)]
pub struct App {
    posts: Arc<dyn PostStore>,
    contacts: Arc<dyn ContactStore>,
    publish_hook: Option<Arc<dyn PublishHook>>,
    contact_notifier: Option<Arc<dyn ContactNotifier>>,
    generator: Option<Arc<dyn Generator>>,
    admin_password: Arc<str>,
    auto_publish: bool,
    generate_language: Language,
    scheduler: Arc<Scheduler>,
}

impl App {
    /// 创建一个新的 [`App`] 实例，`store` 同时作为文章与联系请求的存储
    pub fn new<S>(store: Arc<S>, admin_password: &str) -> App
    where
        S: PostStore + ContactStore + 'static,
    {
        Self {
            posts: store.clone(),
            contacts: store,
            publish_hook: None,
            contact_notifier: None,
            generator: None,
            admin_password: Arc::from(admin_password),
            auto_publish: false,
            generate_language: Language::En,
            scheduler: Arc::new(Scheduler::new(None)),
        }
    }

    /// 根据 [`Config`] 组装完整的应用
    ///
    /// 未配置 `DATABASE_URL` 时使用进程内存储。
    pub async fn from_config(config: &Config) -> Result<App> {
        let mut app = match &config.database_url {
            Some(url) => App::new(Arc::new(PgStore::connect(url).await?), config.admin_password()),
            None => {
                tracing::warn!("DATABASE_URL not set, posts are kept in memory");
                App::new(Arc::new(MemoryStore::new()), config.admin_password())
            }
        };

        if let Some(url) = &config.webhook_url {
            app = app.with_publish_hook(Arc::new(WebhookNotifier::new(url)?));
        }
        if let Some(url) = &config.generator_url {
            app = app.with_generator(Arc::new(HttpGenerator::new(
                url,
                config.generator_key.as_deref(),
            )?));
        }
        match (&config.resend_api_key, &config.notification_email) {
            (Some(key), Some(to)) => {
                app = app.with_contact_notifier(Arc::new(ResendMailer::new(
                    key,
                    &config.sender_email,
                    to,
                )?));
            }
            _ => tracing::info!("contact email notification disabled"),
        }

        Ok(app
            .with_auto_publish(config.auto_publish)
            .with_generate_language(config.generate_language)
            .with_schedule(config.generate_interval()))
    }

    pub fn with_publish_hook(mut self, hook: Arc<dyn PublishHook>) -> Self {
        self.publish_hook = Some(hook);
        self
    }

    pub fn with_contact_notifier(mut self, notifier: Arc<dyn ContactNotifier>) -> Self {
        self.contact_notifier = Some(notifier);
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_auto_publish(mut self, auto_publish: bool) -> Self {
        self.auto_publish = auto_publish;
        self
    }

    pub fn with_generate_language(mut self, language: Language) -> Self {
        self.generate_language = language;
        self
    }

    pub fn with_schedule(mut self, interval: Option<Duration>) -> Self {
        self.scheduler = Arc::new(Scheduler::new(interval));
        self
    }

    /// 获取文章存储
    pub fn posts(&self) -> &dyn PostStore {
        self.posts.as_ref()
    }

    /// 获取联系请求存储
    pub fn contacts(&self) -> &dyn ContactStore {
        self.contacts.as_ref()
    }

    pub fn generator(&self) -> Option<Arc<dyn Generator>> {
        self.generator.clone()
    }

    pub fn admin_password(&self) -> &str {
        &self.admin_password
    }

    pub fn auto_publish(&self) -> bool {
        self.auto_publish
    }

    pub fn generate_language(&self) -> Language {
        self.generate_language
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_status(&self) -> SchedulerStatus {
        self.scheduler.status(self.auto_publish)
    }

    /// 发布文章
    ///
    /// 只有状态真正从草稿变为已发布时才通知 webhook。
    /// 通知在后台执行，失败仅记录日志，不影响发布结果。
    pub async fn publish(&self, id: &str) -> Result<Post> {
        let transition = self.posts.set_status(id, PostStatus::Published).await?;

        if transition.changed {
            tracing::info!(id, slug = %transition.post.slug, "post published");
            if let Some(hook) = self.publish_hook.clone() {
                let post = transition.post.clone();
                tokio::spawn(async move {
                    if let Err(e) = hook.post_published(&post).await {
                        tracing::warn!(%e, slug = %post.slug, "publish webhook failed");
                    }
                });
            }
        }

        Ok(transition.post)
    }

    pub async fn unpublish(&self, id: &str) -> Result<Post> {
        let transition = self.posts.set_status(id, PostStatus::Draft).await?;
        if transition.changed {
            tracing::info!(id, slug = %transition.post.slug, "post unpublished");
        }
        Ok(transition.post)
    }

    /// 保存联系请求，并在后台发送邮件通知
    pub async fn submit_contact(&self, new: NewContact) -> Result<Contact> {
        let contact = Contact::submit(new, chrono::Utc::now())?;
        self.contacts.save_contact(&contact).await?;

        if let Some(notifier) = self.contact_notifier.clone() {
            let contact = contact.clone();
            tokio::spawn(async move {
                if let Err(e) = notifier.contact_submitted(&contact).await {
                    tracing::warn!(%e, "failed to send contact notification");
                }
            });
        }

        Ok(contact)
    }
}
