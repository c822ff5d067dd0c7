// Install Generator (§4.6): turns a stored Server plus a target client into a
// ready-to-paste config snippet, per-OS config file path, and the env vars it needs.

use serde::Serialize;
use serde_json::{json, Value};

use crate::types::{Client, EnvVar, RegistryType, Server};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallStrategy {
    Remote,
    Npm,
    Pypi,
    Docker,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigPaths {
    pub mac: String,
    pub windows: String,
    pub linux: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallPayload {
    pub client: Client,
    pub server_key: String,
    pub strategy: InstallStrategy,
    pub snippet: Value,
    pub config_paths: ConfigPaths,
    pub env_vars_needed: Vec<EnvVar>,
    pub post_install_note: String,
}

/// Secret vars render as `<YOUR_VALUE>`; non-secret vars render their description, or
/// `<VALUE>` if no description is present.
fn placeholder(var: &EnvVar) -> String {
    if var.is_secret {
        "<YOUR_VALUE>".to_string()
    } else {
        var.description.clone().unwrap_or_else(|| "<VALUE>".to_string())
    }
}

fn env_map(vars: &[EnvVar]) -> Option<Value> {
    if vars.is_empty() {
        return None;
    }
    let mut map = serde_json::Map::new();
    for var in vars {
        map.insert(var.name.clone(), Value::String(placeholder(var)));
    }
    Some(Value::Object(map))
}

/// Last path segment of `id`, or `slug` if `id` has no `/`.
fn server_key(server: &Server) -> String {
    match server.id.rsplit_once('/') {
        Some((_, tail)) if !tail.is_empty() => tail.to_string(),
        _ => server.slug.as_str().to_string(),
    }
}

fn strategy_for(server: &Server) -> InstallStrategy {
    if server.has_remote && server.remote_url.is_some() {
        InstallStrategy::Remote
    } else if server.registry_type == Some(RegistryType::Npm) && server.package_identifier.is_some() {
        InstallStrategy::Npm
    } else if server.registry_type == Some(RegistryType::Pypi) && server.package_identifier.is_some() {
        InstallStrategy::Pypi
    } else if server.registry_type == Some(RegistryType::Oci) && server.package_identifier.is_some() {
        InstallStrategy::Docker
    } else {
        InstallStrategy::Fallback
    }
}

fn server_config(server: &Server, strategy: InstallStrategy) -> Value {
    match strategy {
        InstallStrategy::Remote => {
            let mut obj = serde_json::Map::new();
            obj.insert("url".to_string(), json!(server.remote_url));
            if let Some(env) = env_map(&server.environment_variables) {
                obj.insert("env".to_string(), env);
            }
            Value::Object(obj)
        }
        InstallStrategy::Npm => {
            let identifier = server.package_identifier.clone().unwrap_or_default();
            let mut obj = serde_json::Map::new();
            obj.insert("command".to_string(), json!("npx"));
            obj.insert("args".to_string(), json!(["-y", identifier]));
            if let Some(env) = env_map(&server.environment_variables) {
                obj.insert("env".to_string(), env);
            }
            Value::Object(obj)
        }
        InstallStrategy::Pypi => {
            let identifier = server.package_identifier.clone().unwrap_or_default();
            let mut obj = serde_json::Map::new();
            obj.insert("command".to_string(), json!("uvx"));
            obj.insert("args".to_string(), json!([identifier]));
            if let Some(env) = env_map(&server.environment_variables) {
                obj.insert("env".to_string(), env);
            }
            Value::Object(obj)
        }
        InstallStrategy::Docker => {
            let identifier = server.package_identifier.clone().unwrap_or_default();
            let mut args = vec!["run".to_string(), "-i".to_string()];
            for var in &server.environment_variables {
                args.push("-e".to_string());
                args.push(format!("{}={}", var.name, placeholder(var)));
            }
            args.push(identifier);
            let mut obj = serde_json::Map::new();
            obj.insert("command".to_string(), json!("docker"));
            obj.insert("args".to_string(), json!(args));
            Value::Object(obj)
        }
        InstallStrategy::Fallback => {
            let mut obj = serde_json::Map::new();
            obj.insert("repositoryUrl".to_string(), json!(server.repository_url));
            obj.insert("note".to_string(), json!("manual install required"));
            Value::Object(obj)
        }
    }
}

fn top_level_key(client: Client) -> &'static str {
    match client {
        Client::ClineVscode => "servers",
        _ => "mcpServers",
    }
}

fn config_paths(client: Client) -> ConfigPaths {
    match client {
        Client::ClaudeDesktop => ConfigPaths {
            mac: "~/Library/Application Support/Claude/claude_desktop_config.json".to_string(),
            windows: "%APPDATA%\\Claude\\claude_desktop_config.json".to_string(),
            linux: "~/.config/Claude/claude_desktop_config.json".to_string(),
        },
        Client::Cursor => ConfigPaths {
            mac: "~/.cursor/mcp.json".to_string(),
            windows: "%USERPROFILE%\\.cursor\\mcp.json".to_string(),
            linux: "~/.cursor/mcp.json".to_string(),
        },
        Client::ClaudeCode => ConfigPaths {
            mac: ".mcp.json (project) or ~/.claude.json (global)".to_string(),
            windows: ".mcp.json (project) or %USERPROFILE%\\.claude.json (global)".to_string(),
            linux: ".mcp.json (project) or ~/.claude.json (global)".to_string(),
        },
        Client::ClineVscode => ConfigPaths {
            mac: ".vscode/mcp.json".to_string(),
            windows: ".vscode/mcp.json".to_string(),
            linux: ".vscode/mcp.json".to_string(),
        },
        Client::Windsurf => ConfigPaths {
            mac: "~/.codeium/windsurf/mcp_config.json".to_string(),
            windows: "%USERPROFILE%\\.codeium\\windsurf\\mcp_config.json".to_string(),
            linux: "~/.codeium/windsurf/mcp_config.json".to_string(),
        },
        Client::Generic => ConfigPaths {
            mac: "(client-specific; consult its documentation)".to_string(),
            windows: "(client-specific; consult its documentation)".to_string(),
            linux: "(client-specific; consult its documentation)".to_string(),
        },
    }
}

fn post_install_note(client: Client) -> &'static str {
    match client {
        Client::ClaudeDesktop => "Restart Claude Desktop to activate.",
        Client::Cursor => "Restart Cursor to activate.",
        Client::ClaudeCode => "Restart your Claude Code session to activate.",
        Client::ClineVscode => "Reload the VS Code window to activate.",
        Client::Windsurf => "Restart Windsurf to activate.",
        Client::Generic => "Merge this snippet into your client's MCP configuration.",
    }
}

/// Builds the full install payload for `server` against `client`. There is no failure
/// mode here — an unresolvable key is a `getServerDetails` concern, not this function's.
pub fn generate_install(server: &Server, client: Client) -> InstallPayload {
    let strategy = strategy_for(server);
    let key = server_key(server);
    let config = server_config(server, strategy);

    let mut top = serde_json::Map::new();
    let mut inner = serde_json::Map::new();
    inner.insert(key.clone(), config);
    top.insert(top_level_key(client).to_string(), Value::Object(inner));

    InstallPayload {
        client,
        server_key: key,
        strategy,
        snippet: Value::Object(top),
        config_paths: config_paths(client),
        env_vars_needed: server.environment_variables.clone(),
        post_install_note: post_install_note(client).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize, RawEntry, RawPackage};
    use crate::types::Source;

    fn github_server() -> Server {
        normalize(
            Source::Official,
            RawEntry {
                id: "io.modelcontextprotocol/github".to_string(),
                name: "io.modelcontextprotocol/github".to_string(),
                description: "GitHub API access".to_string(),
                raw_data: serde_json::json!({}),
                packages: vec![RawPackage {
                    registry_type: Some(RegistryType::Npm),
                    identifier: Some("@modelcontextprotocol/server-github".to_string()),
                    transport_type: None,
                    environment_variables: vec![EnvVar {
                        name: "GITHUB_TOKEN".to_string(),
                        description: None,
                        format: None,
                        is_secret: true,
                    }],
                }],
                ..Default::default()
            },
        )
    }

    #[test]
    fn scenario_s4_cursor_npm_secret_env() {
        let server = github_server();
        let payload = generate_install(&server, Client::Cursor);
        assert_eq!(payload.strategy, InstallStrategy::Npm);
        assert_eq!(payload.server_key, "github");
        assert_eq!(
            payload.snippet,
            json!({
                "mcpServers": {
                    "github": {
                        "command": "npx",
                        "args": ["-y", "@modelcontextprotocol/server-github"],
                        "env": {"GITHUB_TOKEN": "<YOUR_VALUE>"}
                    }
                }
            })
        );
        assert_eq!(payload.config_paths.mac, "~/.cursor/mcp.json");
        assert_eq!(payload.env_vars_needed.len(), 1);
        assert_eq!(payload.env_vars_needed[0].name, "GITHUB_TOKEN");
    }

    #[test]
    fn scenario_s5_cline_uses_servers_key() {
        let server = github_server();
        let payload = generate_install(&server, Client::ClineVscode);
        let obj = payload.snippet.as_object().unwrap();
        assert!(obj.contains_key("servers"));
        assert!(!obj.contains_key("mcpServers"));
    }

    #[test]
    fn remote_strategy_wins_over_package_when_both_present() {
        let mut server = github_server();
        server.has_remote = true;
        server.remote_url = Some("https://example.com/mcp".to_string());
        let payload = generate_install(&server, Client::Cursor);
        assert_eq!(payload.strategy, InstallStrategy::Remote);
    }

    #[test]
    fn no_package_or_remote_falls_back() {
        let mut server = github_server();
        server.registry_type = None;
        server.package_identifier = None;
        server.has_remote = false;
        server.remote_url = None;
        let payload = generate_install(&server, Client::Generic);
        assert_eq!(payload.strategy, InstallStrategy::Fallback);
    }

    #[test]
    fn non_secret_env_var_uses_description_or_placeholder() {
        let mut server = github_server();
        server.environment_variables = vec![
            EnvVar { name: "REGION".to_string(), description: Some("AWS region".to_string()), format: None, is_secret: false },
            EnvVar { name: "MODE".to_string(), description: None, format: None, is_secret: false },
        ];
        let payload = generate_install(&server, Client::Cursor);
        let env = &payload.snippet["mcpServers"]["github"]["env"];
        assert_eq!(env["REGION"], "AWS region");
        assert_eq!(env["MODE"], "<VALUE>");
    }
}
