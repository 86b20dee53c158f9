use serde::{ Deserialize, Serialize };
use serde_json::{ Map, Value };

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    #[serde(default)]
    pub size: Option<u64>,
}

impl DirectoryEntry {
    pub fn meta_label(&self) -> String {
        if self.is_dir {
            return "Folder".to_string();
        }
        match self.size {
            Some(size) if size > 0 => format!("{} bytes", size),
            _ => "File".to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct DrivesResponse {
    #[serde(default)]
    pub drives: Vec<String>,
}

#[derive(Deserialize, Debug)]
pub struct BrowseResponse {
    #[serde(default)]
    pub items: Vec<DirectoryEntry>,
}

#[derive(Deserialize, Debug)]
pub struct ReadResponse {
    pub content: String,
}

#[derive(Serialize, Debug)]
pub struct SaveRequest<'a> {
    pub path: &'a str,
    pub content: &'a str,
}

#[derive(Serialize, Debug)]
pub struct PromptRequest<'a> {
    pub prompt: &'a str,
}

/// Loose reply object. The server answers mutations with `{message}`,
/// `{error}` or an ad-hoc object such as `{status, path}`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ServerReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl ServerReply {
    #[cfg(test)]
    pub fn message(text: &str) -> Self {
        ServerReply { message: Some(text.to_string()), ..Default::default() }
    }

    #[cfg(test)]
    pub fn error(text: &str) -> Self {
        ServerReply { error: Some(text.to_string()), ..Default::default() }
    }

    pub fn summary(&self) -> String {
        if let Some(message) = &self.message {
            return message.to_string();
        }
        if let Some(error) = &self.error {
            return error.to_string();
        }
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_accept_missing_or_null_size() {
        let items: BrowseResponse = serde_json
            ::from_str(
                r#"{"items":[
                    {"name":"docs","path":"/home/docs","is_dir":true,"size":null},
                    {"name":"a.txt","path":"/home/a.txt","is_dir":false,"size":12},
                    {"name":"empty","path":"/home/empty","is_dir":false}
                ]}"#
            )
            .unwrap();

        let labels: Vec<String> = items.items
            .iter()
            .map(|e| e.meta_label())
            .collect();
        assert_eq!(labels, vec!["Folder", "12 bytes", "File"]);
    }

    #[test]
    fn zero_sized_file_is_labelled_file() {
        let entry = DirectoryEntry {
            name: "x".to_string(),
            path: "/x".to_string(),
            is_dir: false,
            size: Some(0),
        };
        assert_eq!(entry.meta_label(), "File");
    }

    #[test]
    fn summary_prefers_message_then_error_then_json() {
        assert_eq!(ServerReply::message("Created file /a").summary(), "Created file /a");
        assert_eq!(ServerReply::error("Could not parse prompt").summary(), "Could not parse prompt");

        let reply: ServerReply = serde_json
            ::from_str(r#"{"status":"ok","path":"/a"}"#)
            .unwrap();
        assert_eq!(reply.summary(), r#"{"path":"/a","status":"ok"}"#);
    }

    #[test]
    fn prompt_reply_keeps_extra_fields() {
        let reply: ServerReply = serde_json
            ::from_str(r#"{"message":"renamed","from":"/a","to":"/b"}"#)
            .unwrap();
        assert_eq!(reply.summary(), "renamed");
        assert_eq!(reply.rest.get("to"), Some(&serde_json::json!("/b")));
    }
}
