use serde_json::json;

use crate::model::{FieldDescriptor, PluginConfig};

fn network_category() -> Vec<FieldDescriptor> {
    serde_json::from_value(json!([
        {
            "key": "timeout",
            "label": "Timeout",
            "fieldType": "integer",
            "defaultValue": 10,
            "value": 30,
            "validation": {"minValue": 1, "maxValue": 300}
        }
    ]))
    .expect("valid descriptors")
}

fn posix_plugin() -> PluginConfig {
    serde_json::from_value(json!({
        "name": "posix",
        "version": "1.2.0",
        "description": "POSIX accounts and groups",
        "enabled": true,
        "sections": [
            {"id": "ids", "label": "ID ranges", "fields": [
                {"key": "uid_min", "fieldType": "integer", "defaultValue": 10000,
                 "validation": {"minValue": 1000, "maxValue": 65534}},
                {"key": "uid_max", "fieldType": "integer", "defaultValue": 60000,
                 "validation": {"minValue": 1000, "maxValue": 65534}}
            ]},
            {"id": "naming", "label": "Naming", "fields": [
                {"key": "group_rdn", "fieldType": "string", "defaultValue": "cn",
                 "validation": {"pattern": "^[a-z][a-z0-9_-]*$",
                                "patternError": "Must be a lowercase attribute name"}},
                {"key": "shells", "fieldType": "multiselect", "defaultValue": ["/bin/bash"]}
            ]}
        ],
        "config": {"uid_min": 10000, "uid_max": 60000, "group_rdn": "cn", "shells": ["/bin/bash", "/bin/zsh"]}
    }))
    .expect("valid plugin")
}
