//! Email builders. Bodies are intentionally plain.

use crate::mailer::OutgoingEmail;

/// Escapes text for inclusion in an HTML body.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Tells a creator their module is now published.
#[must_use]
pub fn module_approved(to: &str, creator_name: &str, module_title: &str, module_url: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_owned(),
        subject: format!("Tu módulo \"{module_title}\" fue aprobado"),
        html: format!(
            "<p>Hola {name},</p>\
             <p>Tu módulo <strong>{title}</strong> ya está publicado en el marketplace.</p>\
             <p><a href=\"{url}\">Ver módulo</a></p>",
            name = escape_html(creator_name),
            title = escape_html(module_title),
            url = escape_html(module_url),
        ),
    }
}

/// Tells a creator their module went back to draft, with the reviewer notes.
#[must_use]
pub fn module_rejected(to: &str, creator_name: &str, module_title: &str, notes: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_owned(),
        subject: format!("Tu módulo \"{module_title}\" necesita cambios"),
        html: format!(
            "<p>Hola {name},</p>\
             <p>Revisamos tu módulo <strong>{title}</strong> y regresó a borrador.</p>\
             <p>Comentarios del revisor:</p><blockquote>{notes}</blockquote>",
            name = escape_html(creator_name),
            title = escape_html(module_title),
            notes = escape_html(notes),
        ),
    }
}

/// Confirms a completed purchase.
#[must_use]
pub fn purchase_confirmation(
    to: &str,
    buyer_name: &str,
    module_titles: &[String],
    enrollments_created: u64,
    dashboard_url: &str,
) -> OutgoingEmail {
    let items: String = module_titles
        .iter()
        .map(|title| format!("<li>{}</li>", escape_html(title)))
        .collect();
    OutgoingEmail {
        to: to.to_owned(),
        subject: "Confirmación de compra".to_owned(),
        html: format!(
            "<p>Hola {name},</p>\
             <p>Tu compra se procesó correctamente. Inscripciones creadas: {enrollments_created}.</p>\
             <ul>{items}</ul>\
             <p><a href=\"{url}\">Ir a mis cursos</a></p>",
            name = escape_html(buyer_name),
            url = escape_html(dashboard_url),
        ),
    }
}

/// Announces an issued certificate with its public verification link.
#[must_use]
pub fn certificate_issued(
    to: &str,
    holder_name: &str,
    module_title: &str,
    verification_code: &str,
    verify_url: &str,
) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_owned(),
        subject: format!("Tu certificado de \"{module_title}\""),
        html: format!(
            "<p>¡Felicidades {name}!</p>\
             <p>Completaste <strong>{title}</strong>.</p>\
             <p>Código de verificación: <code>{code}</code></p>\
             <p><a href=\"{url}\">Verificar certificado</a></p>",
            name = escape_html(holder_name),
            title = escape_html(module_title),
            code = escape_html(verification_code),
            url = escape_html(verify_url),
        ),
    }
}
