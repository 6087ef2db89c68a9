// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use csdl_openapi::commands::process_command;
use csdl_openapi::commands::Commands;
use csdl_openapi::commands::OptionOverrides;
use csdl_openapi::config::Options;
use csdl_openapi::csdl2openapi;
use csdl_openapi::openapi::Error;
use pretty_assertions::assert_eq;
use serde_json::json;
use serde_json::Value;
use std::error::Error as StdError;
use std::fs;
use tempfile::TempDir;

fn service() -> Value {
    json!({
        "$Version": "4.01",
        "$EntityContainer": "sales.Service",
        "$Reference": {
            "https://oasis-tcs.github.io/odata-vocabularies/vocabularies/Org.OData.Capabilities.V1.json": {
                "$Include": [{ "$Namespace": "Org.OData.Capabilities.V1", "$Alias": "Capabilities" }]
            },
            "https://oasis-tcs.github.io/odata-vocabularies/vocabularies/Org.OData.Core.V1.json": {
                "$Include": [{ "$Namespace": "Org.OData.Core.V1", "$Alias": "Core" }]
            }
        },
        "sales": {
            "Customer": {
                "$Kind": "EntityType",
                "$Key": ["ID"],
                "ID": { "$Type": "Edm.Int32" },
                "name": { "$Nullable": true },
                "orders": {
                    "$Kind": "NavigationProperty",
                    "$Type": "sales.Order",
                    "$Collection": true,
                    "$Partner": "customer"
                },
                "addresses": {
                    "$Kind": "NavigationProperty",
                    "$Type": "sales.Address",
                    "$Collection": true,
                    "$ContainsTarget": true
                }
            },
            "Order": {
                "$Kind": "EntityType",
                "$Key": ["ID"],
                "ID": { "$Type": "Edm.Int32" },
                "customer": {
                    "$Kind": "NavigationProperty",
                    "$Type": "sales.Customer",
                    "$Partner": "orders"
                }
            },
            "Address": {
                "$Kind": "EntityType",
                "$Key": ["id"],
                "id": { "$Type": "Edm.Int32" },
                "city": {}
            },
            "Service": {
                "$Kind": "EntityContainer",
                "Customers": {
                    "$Collection": true,
                    "$Type": "sales.Customer",
                    "$NavigationPropertyBinding": { "orders": "Orders" }
                },
                "Orders": {
                    "$Collection": true,
                    "$Type": "sales.Order",
                    "$NavigationPropertyBinding": { "customer": "Customers" }
                },
                "me": {
                    "$Type": "sales.Customer",
                    "$NavigationPropertyBinding": { "orders": "Orders" }
                }
            }
        }
    })
}

fn compile(csdl: &Value) -> Value {
    csdl2openapi(csdl, &Options::default()).expect("OpenAPI document")
}

fn path_keys(openapi: &Value) -> Vec<String> {
    openapi["paths"]
        .as_object()
        .map(|paths| paths.keys().cloned().collect())
        .unwrap_or_default()
}

#[test]
fn test_paths_of_service() {
    let openapi = compile(&service());
    assert_eq!(
        path_keys(&openapi),
        [
            "/$batch",
            "/Customers",
            "/Customers({ID})",
            "/Customers({ID})/addresses",
            "/Customers({ID})/addresses({id_1})",
            "/Customers({ID})/orders",
            "/Orders",
            "/Orders({ID})",
            "/Orders({ID})/customer",
            "/me",
            "/me/addresses",
            "/me/addresses({id_1})",
            "/me/orders",
        ]
    );
}

#[test]
fn test_navigation_operations() {
    let openapi = compile(&service());
    let orders = &openapi["paths"]["/Customers({ID})/orders"];
    assert_eq!(orders["get"]["summary"], "Retrieves a list of orders of a customer.");
    assert_eq!(orders["get"]["tags"], json!(["Customers", "Orders"]));
    assert_eq!(orders["post"]["summary"], "Creates a single order of a customer.");
    assert_eq!(orders["parameters"][0]["name"], "ID");
    assert_eq!(orders["parameters"][0]["in"], "path");

    let me_orders = &openapi["paths"]["/me/orders"];
    assert_eq!(me_orders["get"]["summary"], "Retrieves a list of orders of me.");

    let address = &openapi["paths"]["/Customers({ID})/addresses({id_1})"];
    let names: Vec<&Value> = address["parameters"]
        .as_array()
        .into_iter()
        .flatten()
        .map(|p| &p["name"])
        .collect();
    assert_eq!(names, [&json!("ID"), &json!("id_1")]);
    assert!(address.get("get").is_some());
    assert!(address.get("patch").is_some());
    assert!(address.get("delete").is_some());
}

#[test]
fn test_singleton_operations() {
    let openapi = compile(&service());
    let me = &openapi["paths"]["/me"];
    assert_eq!(me["get"]["summary"], "Retrieves me.");
    assert_eq!(me["patch"]["summary"], "Changes me.");
    assert!(me.get("delete").is_none());
    assert!(me.get("post").is_none());
}

#[test]
fn test_components() {
    let openapi = compile(&service());
    let schemas = openapi["components"]["schemas"].as_object().expect("schemas");
    for name in [
        "sales.Address",
        "sales.Customer",
        "sales.Customer-create",
        "sales.Customer-update",
        "sales.Order",
        "count",
        "error",
    ] {
        assert!(schemas.contains_key(name), "missing schema {name}");
    }
    let parameters: Vec<&String> = openapi["components"]["parameters"]
        .as_object()
        .expect("parameters")
        .keys()
        .collect();
    assert_eq!(parameters, ["top", "skip", "count", "search"]);
    assert_eq!(
        openapi["components"]["responses"]["error"]["content"]["application/json"]["schema"],
        json!({ "$ref": "#/components/schemas/error" })
    );
}

#[test]
fn test_max_levels() {
    let options = Options {
        max_levels: 1,
        ..Options::default()
    };
    let openapi = csdl2openapi(&service(), &options).expect("OpenAPI document");
    let paths = path_keys(&openapi);
    assert!(paths.contains(&"/Customers({ID})/addresses".to_string()));
    assert!(!paths.contains(&"/Customers({ID})/addresses({id_1})".to_string()));
}

#[test]
fn test_navigation_restrictions() {
    let mut csdl = service();
    csdl["sales"]["Service"]["Customers"]["@Capabilities.NavigationRestrictions"] = json!({
        "RestrictedProperties": [
            { "NavigationProperty": "orders", "Navigability": "None" }
        ]
    });
    let paths = path_keys(&compile(&csdl));
    assert!(!paths.contains(&"/Customers({ID})/orders".to_string()));
    assert!(paths.contains(&"/Customers({ID})/addresses".to_string()));
    assert!(paths.contains(&"/me/orders".to_string()));
}

#[test]
fn test_key_as_segment() {
    let mut csdl = service();
    csdl["sales"]["Service"]["@Capabilities.KeyAsSegmentSupported"] = json!(true);
    let paths = path_keys(&compile(&csdl));
    assert!(paths.contains(&"/Customers/{ID}".to_string()));
    assert!(paths.contains(&"/Customers/{ID}/addresses/{id_1}".to_string()));
}

#[test]
fn test_batch_not_supported() {
    let mut csdl = service();
    csdl["sales"]["Service"]["@Capabilities.BatchSupported"] = json!(false);
    let paths = path_keys(&compile(&csdl));
    assert!(!paths.contains(&"/$batch".to_string()));
    assert!(paths.contains(&"/Customers".to_string()));
}

#[test]
fn test_output_is_deterministic_and_input_unchanged() -> Result<(), Box<dyn StdError>> {
    let csdl = service();
    let original = csdl.clone();
    let first = serde_json::to_string(&compile(&csdl))?;
    let second = serde_json::to_string(&compile(&csdl))?;
    assert_eq!(first, second);
    assert_eq!(csdl, original);
    Ok(())
}

#[test]
fn test_not_indexable_by_key() {
    let mut csdl = service();
    csdl["sales"]["Service"]["Customers"]["@Capabilities.IndexableByKey"] = json!(false);
    let paths = path_keys(&compile(&csdl));
    assert!(paths.contains(&"/Customers".to_string()));
    assert!(!paths.iter().any(|p| p.starts_with("/Customers(")));
    assert!(paths.contains(&"/Orders({ID})".to_string()));
}

#[test]
fn test_read_restrictions() {
    let mut csdl = service();
    csdl["sales"]["Service"]["Orders"]["@Capabilities.ReadRestrictions"] = json!({
        "Description": "Lists all orders",
        "ReadByKeyRestrictions": { "Readable": false }
    });
    let openapi = compile(&csdl);
    let orders = &openapi["paths"]["/Orders"];
    assert_eq!(orders["get"]["summary"], "Lists all orders");
    let order = &openapi["paths"]["/Orders({ID})"];
    assert!(order.get("get").is_none());
    assert!(order.get("patch").is_some());

    csdl["sales"]["Service"]["Orders"]["@Capabilities.ReadRestrictions"] = json!({
        "Readable": false,
        "ReadByKeyRestrictions": { "Readable": true }
    });
    let openapi = compile(&csdl);
    assert!(openapi["paths"]["/Orders"].get("get").is_none());
    assert!(openapi["paths"]["/Orders"].get("post").is_some());
    assert!(openapi["paths"]["/Orders({ID})"].get("get").is_some());
}

#[test]
fn test_navigation_read_restrictions_override_target() {
    let mut csdl = service();
    csdl["sales"]["Service"]["Customers"]["@Capabilities.NavigationRestrictions"] = json!({
        "RestrictedProperties": [
            { "NavigationProperty": "orders", "ReadRestrictions": { "Readable": false } }
        ]
    });
    let openapi = compile(&csdl);
    let orders = &openapi["paths"]["/Customers({ID})/orders"];
    assert!(orders.get("get").is_none());
    assert!(orders.get("post").is_some());
    assert!(openapi["paths"]["/Orders"].get("get").is_some());
    assert!(openapi["paths"]["/me/orders"].get("get").is_some());
}

#[test]
fn test_single_navigability_stops_below_property() {
    let mut csdl = service();
    csdl["sales"]["Address"]["owner"] = json!({
        "$Kind": "NavigationProperty",
        "$Type": "sales.Customer"
    });
    let paths = path_keys(&compile(&csdl));
    assert!(paths.contains(&"/Customers({ID})/addresses({id_1})/owner".to_string()));

    csdl["sales"]["Service"]["Customers"]["@Capabilities.NavigationRestrictions"] = json!({
        "RestrictedProperties": [
            { "NavigationProperty": "addresses", "Navigability": "Single" }
        ]
    });
    let paths = path_keys(&compile(&csdl));
    assert!(paths.contains(&"/Customers({ID})/addresses".to_string()));
    assert!(paths.contains(&"/Customers({ID})/addresses({id_1})".to_string()));
    assert!(!paths.contains(&"/Customers({ID})/addresses({id_1})/owner".to_string()));
    assert!(paths.contains(&"/me/addresses({id_1})/owner".to_string()));
}

#[test]
fn test_string_key_is_quoted() {
    let mut csdl = service();
    csdl["sales"]["Order"]["ID"] = json!({ "$Type": "Edm.String" });
    let paths = path_keys(&compile(&csdl));
    assert!(paths.contains(&"/Orders('{ID}')".to_string()));
    assert!(paths.contains(&"/Customers({ID})".to_string()));
}

#[test]
fn test_huge_binary_length() {
    let mut csdl = service();
    csdl["sales"]["Address"]["photo"] = json!({ "$Type": "Edm.Binary", "$MaxLength": u64::MAX });
    let openapi = compile(&csdl);
    let photo = &openapi["components"]["schemas"]["sales.Address"]["properties"]["photo"];
    assert_eq!(photo["format"], "base64url");
    assert!(photo["maxLength"].as_f64().is_some_and(|len| len > 2.4e19));
}

#[test]
fn test_type_library_without_container() {
    let openapi = compile(&json!({
        "$Version": "4.01",
        "lib": {
            "Money": { "$Kind": "ComplexType", "amount": { "$Type": "Edm.Decimal" } }
        }
    }));
    let keys: Vec<&String> = openapi.as_object().expect("object").keys().collect();
    assert!(!keys.iter().any(|k| *k == "servers" || *k == "tags"));
    assert_eq!(openapi["paths"], json!({}));
    assert_eq!(openapi["info"]["description"], "");
}

#[test]
fn test_invalid_servers() {
    let options = Options {
        servers: Some("not json".into()),
        ..Options::default()
    };
    let err = csdl2openapi(&service(), &options).expect_err("invalid servers");
    assert!(matches!(err, Error::InvalidServers(_)));
    assert_eq!(err.to_string(), "The input server object is invalid.");
}

#[test]
fn test_compile_command() -> Result<(), Box<dyn StdError>> {
    let dir = TempDir::new()?;
    let input = dir.path().join("service.json");
    let output = dir.path().join("openapi.json");
    let config = dir.path().join("options.toml");
    fs::write(&input, serde_json::to_string(&service())?)?;
    fs::write(&config, "host = \"services.example.org\"\nbase-path = \"/odata\"\n")?;
    let messages = process_command(&Commands::Compile {
        csdl: input,
        output: Some(output.clone()),
        config: Some(config),
        overrides: OptionOverrides {
            odata_version: Some("4.0".into()),
            ..OptionOverrides::default()
        },
        compact: true,
    })?;
    assert_eq!(messages.len(), 1);
    let openapi: Value = serde_json::from_str(&fs::read_to_string(&output)?)?;
    assert_eq!(openapi["x-odata-version"], "4.0");
    assert_eq!(
        openapi["servers"],
        json!([{ "url": "https://services.example.org/odata" }])
    );
    Ok(())
}

#[test]
fn test_compile_command_prints_document() -> Result<(), Box<dyn StdError>> {
    let dir = TempDir::new()?;
    let input = dir.path().join("service.json");
    fs::write(&input, serde_json::to_string(&service())?)?;
    let messages = process_command(&Commands::Compile {
        csdl: input,
        output: None,
        config: None,
        overrides: OptionOverrides::default(),
        compact: false,
    })?;
    let openapi: Value = serde_json::from_str(&messages[0])?;
    assert_eq!(openapi["openapi"], "3.0.2");
    Ok(())
}
