// Category Engine. The closed taxonomy is data, not configuration, so it lives as a
// `const` table next to the matching rule, the same way `query_sanitization.rs` keeps
// `STOP_WORDS` next to `sanitize_search_query`.

/// One taxonomy entry: a category name and the keywords that match it.
pub struct Category {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
}

pub const TAXONOMY: &[Category] = &[
    Category { name: "filesystem", keywords: &["file", "filesystem", "directory", "folder", "path", "disk", "storage", "fs"] },
    Category { name: "database", keywords: &["database", "sql", "sqlite", "postgres", "mysql", "mongo", "redis", "dynamodb", "supabase", "prisma", "db", "query"] },
    Category { name: "api", keywords: &["api", "rest", "graphql", "endpoint", "webhook", "http", "request"] },
    Category { name: "ai", keywords: &["ai", "llm", "embedding", "openai", "anthropic", "gemini", "machine-learning", "ml", "neural", "gpt", "claude"] },
    Category { name: "web", keywords: &["web", "browser", "scrape", "crawl", "html", "url", "fetch", "puppeteer", "playwright", "selenium"] },
    Category { name: "git", keywords: &["git", "github", "gitlab", "bitbucket", "repo", "commit", "branch", "version-control"] },
    Category { name: "cloud", keywords: &["cloud", "aws", "azure", "gcp", "docker", "kubernetes", "k8s", "terraform", "deploy", "serverless", "lambda"] },
    Category { name: "search", keywords: &["search", "brave", "bing", "elasticsearch", "algolia", "index"] },
    Category { name: "monitoring", keywords: &["monitor", "log", "metric", "alert", "observability", "trace", "datadog", "grafana", "prometheus", "sentry"] },
    Category { name: "security", keywords: &["security", "auth", "encrypt", "vault", "secret", "token", "oauth", "permission", "ssl", "tls"] },
    Category { name: "communication", keywords: &["email", "slack", "discord", "telegram", "notification", "message", "chat", "sms", "twilio"] },
    Category { name: "productivity", keywords: &["notion", "todoist", "calendar", "task", "project", "jira", "trello", "asana", "linear", "schedule"] },
    Category { name: "dev-tools", keywords: &["lint", "format", "test", "debug", "compile", "build", "ci", "npm", "package", "cli", "terminal"] },
    Category { name: "data", keywords: &["csv", "json", "xml", "yaml", "parse", "transform", "etl", "spreadsheet", "excel", "pandas"] },
    Category { name: "media", keywords: &["image", "video", "audio", "media", "photo", "pdf", "document", "convert", "ffmpeg"] },
];

/// A category matches a server iff any of its keywords is a substring of the lowercased
/// `name + " " + description`. Pure, no I/O — the Store calls this per-row to build
/// `listCategoryCounts`, and the Normalizer calls it once per incoming record.
pub fn matching_categories(name: &str, description: &str) -> Vec<&'static str> {
    let haystack = format!("{} {}", name, description).to_lowercase();
    TAXONOMY
        .iter()
        .filter(|c| c.keywords.iter().any(|kw| haystack.contains(kw)))
        .map(|c| c.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_multiple_categories() {
        let cats = matching_categories("Postgres query tool", "");
        assert!(cats.contains(&"database"));
    }

    #[test]
    fn no_match_is_empty() {
        let cats = matching_categories("Widget", "does something unrelated");
        assert!(cats.is_empty());
    }

    #[test]
    fn image_converter_matches_media() {
        let cats = matching_categories("Image converter", "");
        assert_eq!(cats, vec!["media"]);
    }
}
