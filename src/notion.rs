//! Notion page payload shapes.
//!
//! Builders for the JSON the pages endpoint expects. Property shapes are
//! keyed by display name at the call site; `properties` uses an ordered
//! map so the field schema's declaration order survives serialization.

use serde_json::{Map, Value, json};

/// API version pinned on every archive request.
pub const NOTION_VERSION: &str = "2022-06-28";

/// `parent` object targeting a database.
pub fn parent(database_id: &str) -> Value {
    json!({
        "type": "database_id",
        "database_id": database_id,
    })
}

/// `icon` object carrying an emoji.
pub fn icon(emoji: &str) -> Value {
    json!({
        "type": "emoji",
        "emoji": emoji,
    })
}

/// `title` property shape.
pub fn title_property(content: &str) -> Value {
    json!({
        "title": [
            {
                "type": "text",
                "text": { "content": content },
            },
        ],
    })
}

/// `email` property shape.
pub fn email_property(content: &str) -> Value {
    json!({ "email": content })
}

/// `rich_text` property shape.
pub fn rich_text_property(content: &str) -> Value {
    json!({
        "rich_text": [
            {
                "type": "text",
                "text": { "content": content },
            },
        ],
    })
}

/// One paragraph block for the page body.
pub fn paragraph_block(content: &str) -> Value {
    json!({
        "object": "block",
        "type": "paragraph",
        "paragraph": {
            "rich_text": [
                {
                    "type": "text",
                    "text": { "content": content },
                },
            ],
        },
    })
}

/// The full page-creation body.
pub fn page(
    database_id: &str,
    emoji: &str,
    properties: Map<String, Value>,
    children: Vec<Value>,
) -> Value {
    json!({
        "parent": parent(database_id),
        "icon": icon(emoji),
        "properties": properties,
        "children": children,
    })
}
