//! Static tool catalog advertised through `tools/list`.
//!
//! The schema is advisory metadata for the calling agent. Tool calls only check
//! that required arguments are present; enums and types are not enforced and
//! unlisted arguments are stored as sent.

use serde_json::{Map, Value, json};

pub const SAVE_USER_PROFILE: &str = "save_user_profile";
pub const SET_PREFERENCE: &str = "set_preference";
pub const CREATE_TASK: &str = "create_task";
pub const SEARCH_MEMORY: &str = "search_memory";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    String,
    Number,
    StringArray,
}

#[derive(Debug)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub kind: ParameterType,
    pub description: &'static str,
    pub allowed: Option<&'static [&'static str]>,
    pub required: bool,
}

impl ParameterSpec {
    fn new(name: &'static str, kind: ParameterType, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            allowed: None,
            required: false,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = Some(allowed);
        self
    }

    fn schema(&self) -> Value {
        let mut schema = match self.kind {
            ParameterType::String => json!({ "type": "string" }),
            ParameterType::Number => json!({ "type": "number" }),
            ParameterType::StringArray => json!({ "type": "array", "items": { "type": "string" } }),
        };
        if let Some(allowed) = self.allowed {
            schema["enum"] = json!(allowed);
        }
        schema["description"] = Value::String(self.description.to_string());
        schema
    }
}

#[derive(Debug)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Vec<ParameterSpec>,
}

impl ToolDefinition {
    pub fn required(&self) -> Vec<&'static str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect()
    }

    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| (p.name.to_string(), p.schema()))
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": self.required(),
        })
    }

    pub fn to_value(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema(),
        })
    }
}

pub const PREFERENCE_CATEGORIES: &[&str] = &["personal", "system", "notification"];
pub const TASK_PRIORITIES: &[&str] = &["low", "medium", "high", "urgent"];
pub const SEARCH_TYPES: &[&str] = &["all", "users", "preferences", "tasks"];

/// The four tools, always in the same order.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    use ParameterType as Ty;

    vec![
        ToolDefinition {
            name: SAVE_USER_PROFILE,
            description: "Save user profile information. Extract name, age, location, email, and interests from natural language.",
            parameters: vec![
                ParameterSpec::new("name", Ty::String, "User's full name").required(),
                ParameterSpec::new("age", Ty::Number, "User's age in years"),
                ParameterSpec::new("email", Ty::String, "User's email address (optional)"),
                ParameterSpec::new("location", Ty::String, "User's city or country"),
                ParameterSpec::new("interests", Ty::StringArray, "List of hobbies or interests"),
            ],
        },
        ToolDefinition {
            name: SET_PREFERENCE,
            description: "Store a user preference. Use for settings like favorite color, language, etc.",
            parameters: vec![
                ParameterSpec::new("key", Ty::String, "Preference name (e.g., 'favorite_color')")
                    .required(),
                ParameterSpec::new("value", Ty::String, "Preference value").required(),
                ParameterSpec::new("category", Ty::String, "Category type")
                    .one_of(PREFERENCE_CATEGORIES),
            ],
        },
        ToolDefinition {
            name: CREATE_TASK,
            description: "Create a task or reminder",
            parameters: vec![
                ParameterSpec::new("title", Ty::String, "Task title").required(),
                ParameterSpec::new("description", Ty::String, "Detailed description"),
                ParameterSpec::new("priority", Ty::String, "Priority level").one_of(TASK_PRIORITIES),
                ParameterSpec::new("due_date", Ty::String, "Due date (natural language)"),
                ParameterSpec::new("tags", Ty::StringArray, "Task tags"),
            ],
        },
        ToolDefinition {
            name: SEARCH_MEMORY,
            description: "Search stored information",
            parameters: vec![
                ParameterSpec::new("query", Ty::String, "Search query").required(),
                ParameterSpec::new("type", Ty::String, "Type of data to search").one_of(SEARCH_TYPES),
            ],
        },
    ]
}

pub fn tools_list_payload() -> Value {
    let tools: Vec<Value> = tool_definitions()
        .iter()
        .map(ToolDefinition::to_value)
        .collect();
    json!({ "tools": tools })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lists_four_tools_in_fixed_order() {
        let names: Vec<&str> = tool_definitions().iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![SAVE_USER_PROFILE, SET_PREFERENCE, CREATE_TASK, SEARCH_MEMORY]
        );
    }

    #[test]
    fn required_lists_match_tool_contracts() {
        let tools = tool_definitions();
        let required: Vec<Vec<&str>> = tools.iter().map(ToolDefinition::required).collect();
        assert_eq!(
            required,
            vec![vec!["name"], vec!["key", "value"], vec!["title"], vec!["query"]]
        );
        assert!(tools.iter().all(|t| !t.description.is_empty()));
    }

    #[test]
    fn input_schema_carries_enums_and_array_items() {
        let tools = tool_definitions();
        let task = tools
            .iter()
            .find(|t| t.name == CREATE_TASK)
            .expect("create_task must be defined");
        let schema = task.input_schema();

        assert_eq!(schema["type"], "object");
        assert_eq!(
            schema["properties"]["priority"]["enum"],
            json!(["low", "medium", "high", "urgent"])
        );
        assert_eq!(schema["properties"]["tags"]["items"]["type"], "string");
        assert_eq!(schema["required"], json!(["title"]));
    }

    #[test]
    fn properties_keep_declaration_order() {
        let tools = tool_definitions();
        let schema = tools[0].input_schema();
        let keys: Vec<&str> = schema["properties"]
            .as_object()
            .expect("properties must be an object")
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["name", "age", "email", "location", "interests"]);
    }

    #[test]
    fn list_payload_is_stable_across_calls() {
        assert_eq!(tools_list_payload(), tools_list_payload());
        assert_eq!(
            tools_list_payload()["tools"]
                .as_array()
                .map(Vec::len)
                .unwrap_or_default(),
            4
        );
    }
}
