use std::borrow::Cow;

use chrono::{DateTime, Datelike, Utc};

use crate::web::AuthUser;

const SITE_BASE_STYLES: &str = r#"
        :root { color-scheme: light; --bg: #f8fafc; --surface: #ffffff; --border: #e2e8f0; --text: #0f172a; --muted: #475569; --faint: #94a3b8; --accent: #2563eb; --accent-strong: #1d4ed8; --accent-soft: #e0f2fe; --accent-border: #bfdbfe; --danger: #b91c1c; --danger-soft: #fef2f2; --danger-border: #fecaca; --success: #166534; --success-soft: #ecfdf3; --success-border: #bbf7d0; }
        :root[data-theme="dark"] { color-scheme: dark; --bg: #0f172a; --surface: #1e293b; --border: #334155; --text: #e2e8f0; --muted: #94a3b8; --faint: #64748b; --accent: #60a5fa; --accent-strong: #93c5fd; --accent-soft: #1e3a5f; --accent-border: #2c4a73; --danger: #fca5a5; --danger-soft: #3f1d1d; --danger-border: #7f1d1d; --success: #86efac; --success-soft: #14301f; --success-border: #166534; }
        body { font-family: "Helvetica Neue", Arial, sans-serif; margin: 0; background: var(--bg); color: var(--text); min-height: 100vh; display: flex; flex-direction: column; }
        a { color: var(--accent); }
        .site-header { background: var(--surface); border-bottom: 1px solid var(--border); padding: 1rem clamp(1.5rem, 5vw, 3rem); display: flex; justify-content: space-between; align-items: center; flex-wrap: wrap; gap: 1rem; }
        .brand { font-size: 1.25rem; font-weight: 700; color: var(--text); text-decoration: none; }
        .site-nav { display: flex; align-items: center; gap: 1.25rem; flex-wrap: wrap; }
        .site-nav a { color: var(--muted); text-decoration: none; font-weight: 600; }
        .site-nav a:hover { color: var(--accent); }
        .site-nav a.active { color: var(--accent); }
        .nav-actions { display: flex; align-items: center; gap: 0.75rem; }
        .nav-actions .login-link { padding: 0.5rem 1.1rem; border-radius: 999px; background: var(--accent); color: #ffffff; text-decoration: none; font-weight: 600; }
        .nav-actions .login-link:hover { background: var(--accent-strong); }
        .logout-form { margin: 0; }
        .logout-form button { padding: 0.5rem 1.1rem; border: 1px solid var(--border); border-radius: 999px; background: var(--surface); color: var(--muted); font-weight: 600; cursor: pointer; }
        .logout-form button:hover { border-color: var(--accent-border); color: var(--accent); }
        #theme-toggle { border: 1px solid var(--border); background: var(--surface); color: var(--muted); border-radius: 999px; padding: 0.45rem 0.8rem; cursor: pointer; font-size: 0.9rem; }
        #theme-toggle:hover { border-color: var(--accent-border); color: var(--accent); }
        main { flex: 1; padding: clamp(2rem, 5vw, 3rem); max-width: 1100px; margin: 0 auto; width: 100%; box-sizing: border-box; }
        .page-heading { margin: 0 0 0.5rem; font-size: clamp(1.7rem, 3vw, 2.2rem); }
        .page-subtitle { margin: 0 0 2rem; color: var(--muted); }
        .flash { padding: 1rem 1.25rem; border-radius: 10px; margin-bottom: 1.5rem; font-weight: 600; border: 1px solid transparent; }
        .flash.success { background: var(--success-soft); border-color: var(--success-border); color: var(--success); }
        .flash.error { background: var(--danger-soft); border-color: var(--danger-border); color: var(--danger); }
        .panel { background: var(--surface); border-radius: 12px; border: 1px solid var(--border); padding: 1.5rem; box-shadow: 0 18px 40px rgba(15, 23, 42, 0.08); }
        .panel h2 { margin-top: 0; }
        .card-grid { display: grid; gap: 1.5rem; grid-template-columns: repeat(auto-fill, minmax(240px, 1fr)); }
        .card { display: flex; flex-direction: column; background: var(--surface); border: 1px solid var(--border); border-radius: 14px; overflow: hidden; text-decoration: none; color: inherit; transition: transform 0.15s ease, box-shadow 0.15s ease; }
        .card:hover { transform: translateY(-3px); box-shadow: 0 18px 40px rgba(15, 23, 42, 0.12); }
        .card .cover { width: 100%; height: 160px; object-fit: cover; background: var(--accent-soft); }
        .card .cover-placeholder { width: 100%; height: 160px; display: flex; align-items: center; justify-content: center; background: var(--accent-soft); color: var(--accent); font-weight: 700; font-size: 1.5rem; }
        .card-body { padding: 1.1rem 1.25rem 1.25rem; display: flex; flex-direction: column; gap: 0.5rem; }
        .card-body h3 { margin: 0; font-size: 1.05rem; }
        .card-body p { margin: 0; color: var(--muted); font-size: 0.92rem; line-height: 1.55; }
        .card-meta { margin-top: auto; color: var(--faint); font-size: 0.85rem; }
        label { display: block; margin-bottom: 0.5rem; font-weight: 600; color: var(--text); }
        input[type="text"], input[type="email"], input[type="password"], input[type="url"], textarea, select { width: 100%; padding: 0.75rem; border-radius: 8px; border: 1px solid var(--border); background: var(--bg); color: var(--text); box-sizing: border-box; font-family: inherit; font-size: 0.95rem; }
        input:focus, textarea:focus, select:focus { outline: none; border-color: var(--accent); box-shadow: 0 0 0 3px rgba(37, 99, 235, 0.12); }
        textarea { min-height: 140px; resize: vertical; }
        .form-field { margin-bottom: 1.25rem; }
        .field-error { color: var(--danger); font-size: 0.88rem; margin-top: 0.35rem; }
        .field-hint { color: var(--faint); font-size: 0.85rem; margin-top: 0.35rem; }
        button.primary, .button-primary { padding: 0.85rem 1.3rem; border: none; border-radius: 8px; background: var(--accent); color: #ffffff; font-weight: 600; cursor: pointer; text-decoration: none; display: inline-block; }
        button.primary:hover, .button-primary:hover { background: var(--accent-strong); }
        .button-secondary { padding: 0.75rem 1.2rem; border: 1px solid var(--border); border-radius: 8px; background: var(--surface); color: var(--muted); font-weight: 600; cursor: pointer; text-decoration: none; display: inline-block; }
        .button-secondary:hover { border-color: var(--accent-border); color: var(--accent); }
        .button-danger { padding: 0.6rem 1rem; border: 1px solid var(--danger-border); border-radius: 8px; background: var(--danger-soft); color: var(--danger); font-weight: 600; cursor: pointer; }
        table { width: 100%; border-collapse: collapse; margin-top: 1.5rem; background: var(--surface); border: 1px solid var(--border); border-radius: 12px; overflow: hidden; }
        th, td { padding: 0.75rem 1rem; border-bottom: 1px solid var(--border); text-align: left; vertical-align: top; }
        th { background: var(--bg); color: var(--text); font-weight: 600; }
        .status-tag { display: inline-flex; align-items: center; gap: 0.4rem; padding: 0.25rem 0.75rem; border-radius: 999px; font-size: 0.85rem; font-weight: 600; }
        .status-tag.pending { background: #fef3c7; color: #92400e; }
        .status-tag.approved { background: #dcfce7; color: #166534; }
        .status-tag.rejected { background: #fee2e2; color: #b91c1c; }
        .app-footer { margin-top: 3rem; padding: 1.5rem; text-align: center; font-size: 0.85rem; color: var(--faint); border-top: 1px solid var(--border); }
        @media (max-width: 768px) {
            .site-header { flex-direction: column; align-items: flex-start; }
            main { padding: 1.5rem 1rem; }
            table { font-size: 0.9rem; }
            th, td { padding: 0.5rem; }
        }
"#;

/// Client-side appearance preference, kept as an explicit configuration
/// object in localStorage with read/write accessors instead of ad-hoc
/// globals. The inline head script applies the stored theme before first
/// paint to avoid a flash of the wrong scheme.
const THEME_SCRIPT: &str = r#"<script>
const appearanceStore = {
    key: 'jurnal.appearance',
    read() {
        try {
            const raw = localStorage.getItem(this.key);
            const parsed = raw ? JSON.parse(raw) : null;
            return parsed && (parsed.theme === 'dark' || parsed.theme === 'light')
                ? parsed
                : { theme: 'light' };
        } catch (err) {
            return { theme: 'light' };
        }
    },
    write(config) {
        try {
            localStorage.setItem(this.key, JSON.stringify(config));
        } catch (err) {
            // Storage may be unavailable (private mode); the toggle still works for this page.
        }
    },
};

function applyAppearance(config) {
    document.documentElement.dataset.theme = config.theme;
    const toggle = document.getElementById('theme-toggle');
    if (toggle) {
        toggle.textContent = config.theme === 'dark' ? 'Terang' : 'Gelap';
    }
}

applyAppearance(appearanceStore.read());

document.addEventListener('DOMContentLoaded', () => {
    applyAppearance(appearanceStore.read());
    const toggle = document.getElementById('theme-toggle');
    if (toggle) {
        toggle.addEventListener('click', () => {
            const current = appearanceStore.read();
            const next = { theme: current.theme === 'dark' ? 'light' : 'dark' };
            appearanceStore.write(next);
            applyAppearance(next);
        });
    }
});
</script>"#;

/// Navigation entry highlighted on the current page.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ActiveNav {
    Home,
    Publications,
    Catalogs,
    Contact,
    Dashboard,
    None,
}

/// Typed contract between handlers and the shared page shell. Every page
/// enumerates exactly what it passes in rather than handing over an opaque
/// prop bag.
pub struct PageLayout<'a> {
    pub meta_title: &'a str,
    pub active_nav: ActiveNav,
    pub user: Option<&'a AuthUser>,
    pub flash_html: Cow<'a, str>,
    pub content_html: Cow<'a, str>,
    pub extra_style_blocks: Vec<Cow<'a, str>>,
    pub body_scripts: Vec<Cow<'a, str>>,
}

pub fn render_page(layout: PageLayout<'_>) -> String {
    let PageLayout {
        meta_title,
        active_nav,
        user,
        flash_html,
        content_html,
        extra_style_blocks,
        body_scripts,
    } = layout;

    let styles = std::iter::once(Cow::Borrowed(SITE_BASE_STYLES))
        .chain(extra_style_blocks.into_iter())
        .map(|block| block.into_owned())
        .collect::<Vec<_>>()
        .join("\n");

    let scripts = body_scripts
        .into_iter()
        .map(|script| script.into_owned())
        .collect::<Vec<_>>()
        .join("\n");

    let nav = render_nav(active_nav, user);
    let footer = render_footer();

    format!(
        r#"<!DOCTYPE html>
<html lang="id">
<head>
    <meta charset="UTF-8">
    <title>{meta_title}</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
{styles}
    </style>
    {theme_script}
</head>
<body>
    {nav}
    <main>
        {flash_html}
{content_html}
    </main>
    {footer}
{scripts}
</body>
</html>"#,
        meta_title = meta_title,
        styles = styles,
        theme_script = THEME_SCRIPT,
        nav = nav,
        flash_html = flash_html,
        content_html = content_html,
        footer = footer,
        scripts = scripts,
    )
}

fn render_nav(active: ActiveNav, user: Option<&AuthUser>) -> String {
    let items = [
        (ActiveNav::Home, "/", "Beranda"),
        (ActiveNav::Publications, "/publications", "Publikasi"),
        (ActiveNav::Catalogs, "/catalogs", "Katalog"),
        (ActiveNav::Contact, "/contact", "Kontak"),
    ];

    let mut links = items
        .iter()
        .map(|(nav, href, label)| {
            let class = if *nav == active { r#" class="active""# } else { "" };
            format!(r#"<a href="{href}"{class}>{label}</a>"#)
        })
        .collect::<String>();

    if user.is_some() {
        let class = if active == ActiveNav::Dashboard {
            r#" class="active""#
        } else {
            ""
        };
        links.push_str(&format!(r#"<a href="/dashboard"{class}>Dashboard</a>"#));
    }

    let account = match user {
        Some(user) => format!(
            r#"<span>{name}</span>
            <form class="logout-form" method="post" action="/logout">
                <button type="submit">Keluar</button>
            </form>"#,
            name = escape_html(&user.name),
        ),
        None => r#"<a class="login-link" href="/login">Masuk</a>"#.to_string(),
    };

    format!(
        r#"<header class="site-header">
        <a class="brand" href="/">Jurnal &amp; Katalog</a>
        <nav class="site-nav">
            {links}
        </nav>
        <div class="nav-actions">
            <button type="button" id="theme-toggle" aria-label="Ganti tema">Gelap</button>
            {account}
        </div>
    </header>"#,
        links = links,
        account = account,
    )
}

pub fn render_login_page(error: Option<&str>, email_value: &str) -> String {
    let footer = render_footer();
    let error_html = error
        .map(|message| format!(r#"<div class="flash error">{}</div>"#, escape_html(message)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="id">
<head>
    <meta charset="UTF-8">
    <title>Masuk | Jurnal &amp; Katalog</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="robots" content="noindex,nofollow">
    <style>
        :root {{ color-scheme: light; }}
        body {{ font-family: "Helvetica Neue", Arial, sans-serif; display: flex; flex-direction: column; align-items: center; justify-content: center; min-height: 100vh; margin: 0; background: #f1f5f9; color: #0f172a; padding: 1.5rem; box-sizing: border-box; gap: 1.5rem; }}
        main {{ width: 100%; max-width: 440px; display: flex; flex-direction: column; align-items: center; gap: 1.5rem; }}
        .panel {{ background: #ffffff; padding: 2.5rem 2.25rem; border-radius: 18px; box-shadow: 0 20px 60px rgba(15, 23, 42, 0.08); width: 100%; border: 1px solid #e2e8f0; box-sizing: border-box; }}
        h1 {{ margin: 0 0 1rem; font-size: 1.7rem; text-align: center; }}
        p.description {{ margin: 0 0 1.75rem; color: #475569; text-align: center; font-size: 0.95rem; }}
        .flash.error {{ background: #fef2f2; border: 1px solid #fecaca; color: #b91c1c; border-radius: 10px; padding: 0.85rem 1rem; margin-bottom: 1.25rem; font-weight: 600; font-size: 0.92rem; }}
        label {{ display: block; margin-top: 1.2rem; font-weight: 600; color: #0f172a; }}
        input {{ width: 100%; padding: 0.85rem; margin-top: 0.65rem; border-radius: 10px; border: 1px solid #cbd5f5; background: #f8fafc; color: #0f172a; font-size: 1rem; box-sizing: border-box; }}
        input:focus {{ outline: none; border-color: #2563eb; box-shadow: 0 0 0 3px rgba(37, 99, 235, 0.15); }}
        button {{ margin-top: 2rem; width: 100%; padding: 0.95rem; border: none; border-radius: 10px; background: #2563eb; color: #ffffff; font-weight: 600; font-size: 1.05rem; cursor: pointer; }}
        button:hover {{ background: #1d4ed8; }}
        .back-home {{ color: #2563eb; text-decoration: none; font-weight: 600; font-size: 0.92rem; }}
        .app-footer {{ text-align: center; font-size: 0.85rem; color: #64748b; }}
    </style>
</head>
<body>
    <main>
        <section class="panel">
            <h1>Masuk Admin</h1>
            <p class="description">Masuk untuk mengelola publikasi, katalog, dan komentar.</p>
            {error_html}
            <form method="post" action="/login">
                <label for="email">Email</label>
                <input id="email" type="email" name="email" value="{email_value}" required>
                <label for="password">Kata Sandi</label>
                <input id="password" type="password" name="password" required>
                <button type="submit">Masuk</button>
            </form>
        </section>
        <a class="back-home" href="/">&larr; Kembali ke beranda</a>
        {footer}
    </main>
</body>
</html>"#,
        error_html = error_html,
        email_value = escape_html(email_value),
        footer = footer,
    )
}

/// Generic 404 page used by the router fallback and by handlers that cannot
/// find their record or backing file.
pub fn render_not_found() -> String {
    let content = r#"        <section class="panel" style="text-align: center; padding: 3rem 2rem;">
            <h1 style="font-size: 3rem; margin: 0 0 0.5rem;">404</h1>
            <h2 style="margin: 0 0 0.75rem;">Halaman Tidak Ditemukan</h2>
            <p style="color: var(--muted); margin: 0 0 2rem;">Maaf, halaman yang Anda cari tidak tersedia atau telah dipindahkan.</p>
            <a class="button-primary" href="/">Kembali ke Beranda</a>
        </section>
"#;

    render_page(PageLayout {
        meta_title: "Halaman Tidak Ditemukan | Jurnal & Katalog",
        active_nav: ActiveNav::None,
        user: None,
        flash_html: Cow::Borrowed(""),
        content_html: Cow::Borrowed(content),
        extra_style_blocks: Vec::new(),
        body_scripts: Vec::new(),
    })
}

pub fn render_footer() -> String {
    let current_year = Utc::now().year();
    format!(
        r#"<footer class="app-footer">© 2024-{year} Jurnal &amp; Katalog. Seluruh hak cipta.</footer>"#,
        year = current_year
    )
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Shorten body text for card previews, cutting on a character boundary.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    let trimmed = match cut.rfind(' ') {
        Some(idx) if idx > max_chars / 2 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{}…", trimmed.trim_end())
}

/// Card markup for a publication in a listing grid.
pub fn render_publication_card(publication: &crate::web::models::PublicationRow) -> String {
    let title = escape_html(&publication.title);
    let cover = match publication.image.as_deref() {
        Some(image) => format!(
            r#"<img class="cover" src="/media/{src}" alt="{title}">"#,
            src = escape_html(image),
            title = title,
        ),
        None => r#"<div class="cover-placeholder">Publikasi</div>"#.to_string(),
    };

    format!(
        r#"<a class="card" href="/publications/{id}">
                {cover}
                <div class="card-body">
                    <h3>{title}</h3>
                    <p>{excerpt}</p>
                    <span class="card-meta">{author} · {date}</span>
                </div>
            </a>"#,
        id = publication.id,
        cover = cover,
        title = title,
        excerpt = escape_html(&excerpt(&publication.description, 140)),
        author = escape_html(&publication.author_name),
        date = format_date(publication.created_at),
    )
}

/// Card markup for a catalog in a listing grid.
pub fn render_catalog_card(catalog: &crate::web::models::CatalogRow) -> String {
    let nama = escape_html(&catalog.nama);
    let cover = match catalog.gambar_sampul.as_deref() {
        Some(image) => format!(
            r#"<img class="cover" src="/media/{src}" alt="{nama}">"#,
            src = escape_html(image),
            nama = nama,
        ),
        None => r#"<div class="cover-placeholder">Katalog</div>"#.to_string(),
    };
    let pdf_badge = if catalog.pdf_file_buku.is_some() {
        r#"<span class="card-meta">PDF tersedia</span>"#
    } else {
        ""
    };

    format!(
        r#"<a class="card" href="/catalogs/{id}">
                {cover}
                <div class="card-body">
                    <h3>{nama}</h3>
                    <p>{excerpt}</p>
                    {pdf_badge}
                    <span class="card-meta">{author} · {date}</span>
                </div>
            </a>"#,
        id = catalog.id,
        cover = cover,
        nama = nama,
        excerpt = escape_html(&excerpt(&catalog.deskripsi, 140)),
        pdf_badge = pdf_badge,
        author = escape_html(&catalog.author_name),
        date = format_date(catalog.created_at),
    )
}

const MONTH_NAMES_ID: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// Human-formatted Indonesian date, e.g. `12 Januari 2026`.
pub fn format_date(value: DateTime<Utc>) -> String {
    let month = MONTH_NAMES_ID[(value.month0()) as usize];
    format!("{} {} {}", value.day(), month, value.year())
}

/// Date plus time, used in the admin panels, e.g. `12 Januari 2026 09.41`.
pub fn format_datetime(value: DateTime<Utc>) -> String {
    format!("{} {}", format_date(value), value.format("%H.%M"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn format_date_uses_indonesian_month_names() {
        let date = Utc.with_ymd_and_hms(2026, 1, 12, 9, 41, 0).unwrap();
        assert_eq!(format_date(date), "12 Januari 2026");

        let date = Utc.with_ymd_and_hms(2025, 12, 3, 0, 0, 0).unwrap();
        assert_eq!(format_date(date), "3 Desember 2025");
    }

    #[test]
    fn excerpt_keeps_short_text_intact() {
        assert_eq!(excerpt("singkat", 140), "singkat");
    }

    #[test]
    fn excerpt_cuts_on_word_boundary() {
        let text = "Jurnal ilmiah tentang tata kota dan lingkungan binaan di Indonesia";
        let cut = excerpt(text, 30);
        assert!(cut.ends_with('…'));
        assert!(cut.chars().count() <= 31);
        assert!(!cut.contains("binaan"));
    }

    #[test]
    fn excerpt_handles_multibyte_text() {
        let text = "éééééééééé";
        assert_eq!(excerpt(text, 4), "éééé…");
    }

    #[test]
    fn format_datetime_appends_clock_time() {
        let date = Utc.with_ymd_and_hms(2026, 8, 26, 14, 5, 0).unwrap();
        assert_eq!(format_datetime(date), "26 Agustus 2026 14.05");
    }
}
