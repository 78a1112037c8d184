//! Query handlers for the Marketplace context.

use pulldown_cmark::{Options, Parser, html};
use serde::Serialize;
use uuid::Uuid;
use verdant_core::core_value::CoreValue;
use verdant_core::error::DomainError;
use verdant_core::profile::{ProfileRepository, require_platform_admin};

use crate::domain::cart::{CartLine, CartView};
use crate::domain::module::{Lesson, MarketplaceModule, ModuleStatus};
use crate::domain::repository::{CartRepository, ModuleRepository};

/// A lesson with its markdown rendered for display.
#[derive(Debug, Clone, Serialize)]
pub struct LessonView {
    /// The stored lesson.
    #[serde(flatten)]
    pub lesson: Lesson,
    /// `content` rendered to HTML.
    pub content_html: String,
}

/// A published module with its lessons.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleDetail {
    /// The module.
    #[serde(flatten)]
    pub module: MarketplaceModule,
    /// Lessons in order.
    pub lessons: Vec<LessonView>,
}

/// Renders lesson markdown to HTML. Raw HTML in the source is dropped.
#[must_use]
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options).filter(|event| {
        !matches!(
            event,
            pulldown_cmark::Event::Html(_) | pulldown_cmark::Event::InlineHtml(_)
        )
    });
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Lists published modules, optionally filtered by core value wire name.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an unknown core value.
pub async fn list_published_modules(
    core_value: Option<&str>,
    repo: &dyn ModuleRepository,
) -> Result<Vec<MarketplaceModule>, DomainError> {
    let filter = core_value.map(str::parse::<CoreValue>).transpose()?;
    repo.list_modules(ModuleStatus::Published, filter).await
}

/// Loads a published module with rendered lessons.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the module does not exist or is not
/// published.
pub async fn get_published_module(
    module_id: Uuid,
    repo: &dyn ModuleRepository,
) -> Result<ModuleDetail, DomainError> {
    let module = repo
        .find_module(module_id)
        .await?
        .filter(|m| m.status == ModuleStatus::Published)
        .ok_or_else(|| DomainError::not_found("module", module_id))?;

    let lessons = repo
        .list_lessons(module.id)
        .await?
        .into_iter()
        .map(|lesson| LessonView {
            content_html: render_markdown(&lesson.content),
            lesson,
        })
        .collect();

    Ok(ModuleDetail { module, lessons })
}

/// Lists modules waiting for review, oldest submissions last.
///
/// # Errors
///
/// Returns `DomainError::Unauthorized`/`Forbidden` unless the caller is a
/// platform administrator.
pub async fn list_pending_modules(
    reviewer_id: Uuid,
    profiles: &dyn ProfileRepository,
    repo: &dyn ModuleRepository,
) -> Result<Vec<MarketplaceModule>, DomainError> {
    require_platform_admin(reviewer_id, profiles).await?;
    repo.list_modules(ModuleStatus::Review, None).await
}

/// Loads the caller's cart with module titles and subtotal.
///
/// Items whose module has since disappeared are left out.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if persistence fails.
pub async fn get_cart(
    user_id: Uuid,
    carts: &dyn CartRepository,
    modules: &dyn ModuleRepository,
) -> Result<CartView, DomainError> {
    let mut lines = Vec::new();
    for item in carts.list_cart(user_id).await? {
        if let Some(module) = modules.find_module(item.module_id).await? {
            lines.push(CartLine {
                item,
                module_title: module.title,
            });
        }
    }
    Ok(CartView::new(lines))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_markdown_basic_blocks() {
        let html = render_markdown("# Aire\n\nMide el **PM2.5**.");
        assert!(html.contains("<h1>Aire</h1>"));
        assert!(html.contains("<strong>PM2.5</strong>"));
    }

    #[test]
    fn test_render_markdown_drops_raw_html() {
        let html = render_markdown("Hola <script>alert(1)</script> mundo");
        assert!(!html.contains("<script>"));
        assert!(html.contains("Hola"));
    }
}
