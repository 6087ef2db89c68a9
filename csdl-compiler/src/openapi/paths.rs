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

//! Paths for entity sets, singletons and the navigation paths below
//! them.

use crate::csdl::Element;
use crate::openapi::context::Context;
use crate::openapi::schema::Usage;
use crate::openapi::Generator;
use crate::openapi::SchemaSuffix;
use crate::vocabulary::annotations::Annotations as _;
use crate::vocabulary::capabilities::ExpandRestrictions;
use crate::vocabulary::capabilities::NavigationPropertyRestriction;
use crate::vocabulary::capabilities::NavigationRestrictions;
use crate::vocabulary::CapabilitiesTerm;
use indexmap::IndexMap;
use serde_json::json;
use serde_json::Map;
use serde_json::Value;
use std::collections::BTreeMap;
use tagged_types::TaggedType;
use tracing::debug;

/// Path items by path. Paths are emitted in sorted order.
pub(crate) type Paths = BTreeMap<String, Map<String, Value>>;

/// Operation addresses a single entity of a collection by key.
pub type ByKey = TaggedType<bool, ByKeyTag>;
#[doc(hidden)]
#[derive(tagged_types::Tag)]
#[implement(Clone, Copy)]
#[transparent(Debug)]
#[capability(inner_access)]
pub enum ByKeyTag {}

/// Resource addressed by a path: a container child or a navigation
/// property reached from it.
#[derive(Clone)]
pub(crate) struct Segment<'a> {
    pub prefix: String,
    /// Parameters of all keys in the prefix.
    pub parameters: Vec<Value>,
    pub element: &'a Element,
    pub contains_target: bool,
    /// Label or name of the container child the path starts at.
    pub source_name: String,
    pub target_name: Option<String>,
    /// Container child the navigation leads to, if bound.
    pub target: Option<&'a Element>,
    pub level: usize,
    /// Navigation path relative to the root for restriction lookup.
    pub navigation_path: String,
}

impl Segment<'_> {
    /// Last segment of the path.
    pub fn name(&self) -> &str {
        self.prefix
            .rsplit('/')
            .next()
            .unwrap_or(&self.prefix)
    }
}

/// Container child the path starts at.
pub(crate) struct Root<'a> {
    pub element: &'a Element,
    pub auto_exposed: bool,
}

pub(crate) fn has_operations(item: &Map<String, Value>) -> bool {
    item.keys().any(|key| key != "parameters")
}

impl<'a> Generator<'a> {
    /// Paths Object of the entity container.
    pub(crate) fn paths(&self, ctx: &mut Context) -> Map<String, Value> {
        let Some(container) = self.container else {
            return Map::new();
        };
        let mut paths = Paths::new();
        let mut resources = 0;
        for (name, child) in container.elements() {
            resources += 1;
            if let Some(type_name) = child.type_name() {
                let source_name = self
                    .model
                    .element(type_name)
                    .and_then(|t| t.label(self.voc))
                    .unwrap_or(name)
                    .to_string();
                let root = Root {
                    element: child,
                    auto_exposed: self.auto_exposed.contains(name.as_str()),
                };
                let segment = Segment {
                    prefix: format!("/{name}"),
                    parameters: Vec::new(),
                    element: child,
                    contains_target: true,
                    target_name: Some(source_name.clone()),
                    source_name,
                    target: Some(child),
                    level: 0,
                    navigation_path: String::new(),
                };
                self.path_items(ctx, &mut paths, &root, &segment);
            } else if child.action().is_some() {
                self.action_import(ctx, &mut paths, name, child);
            } else if child.function().is_some() {
                self.function_import(ctx, &mut paths, name, child);
            } else {
                debug!(name, "Unrecognized entity container child");
            }
        }
        if resources > 0 {
            self.batch(&mut paths, container);
        }
        paths
            .into_iter()
            .map(|(path, item)| (path, Value::Object(item)))
            .collect()
    }

    fn path_items(&self, ctx: &mut Context, paths: &mut Paths, root: &Root<'a>, segment: &Segment<'a>) {
        let element = segment.element;
        let restrictions = self.navigation_restrictions(root.element, &segment.navigation_path);
        let non_expandable = self.non_expandable_properties(root.element, &segment.navigation_path);

        let mut item = Map::new();
        if !segment.parameters.is_empty() {
            item.insert("parameters".into(), segment.parameters.clone().into());
        }
        self.operation_read(ctx, &mut item, segment, &restrictions, ByKey::new(false), &non_expandable);
        let creatable = segment.contains_target || segment.level < 2 && segment.target.is_some();
        if !root.auto_exposed && element.is_collection() && creatable {
            self.operation_create(ctx, &mut item, segment, &restrictions);
        }
        self.bound_operations(ctx, paths, segment, ByKey::new(false));

        if segment.contains_target {
            if element.is_collection() {
                if segment.level < self.options.max_levels {
                    self.path_items_with_key(ctx, paths, root, segment, &restrictions, &non_expandable);
                }
            } else {
                if !root.auto_exposed {
                    self.operation_update(ctx, &mut item, segment, &restrictions, ByKey::new(false));
                    if element.is_nullable() {
                        self.operation_delete(ctx, &mut item, segment, &restrictions, ByKey::new(false));
                    }
                }
                self.path_items_with_navigation(ctx, paths, root, segment);
            }
        }

        if has_operations(&item) {
            paths.insert(segment.prefix.clone(), item);
        }
    }

    fn path_items_with_key(
        &self,
        ctx: &mut Context,
        paths: &mut Paths,
        root: &Root<'a>,
        segment: &Segment<'a>,
        restrictions: &NavigationPropertyRestriction,
        non_expandable: &[String],
    ) {
        let target_indexable = !segment
            .target
            .is_some_and(|t| t.term_is_false(self.voc, CapabilitiesTerm::IndexableByKey));
        if !restrictions.indexable_by_key.unwrap_or(target_indexable) {
            return;
        }
        let Some(t) = segment.element.type_name().and_then(|t| self.model.element(t)) else {
            debug!(path = segment.prefix, "Unknown entity type");
            return;
        };
        let (key_segment, key_parameters) = self.entity_key(ctx, t, segment.level);
        if key_parameters.is_empty() {
            return;
        }
        let mut parameters = segment.parameters.clone();
        parameters.extend(key_parameters);
        let keyed = Segment {
            prefix: format!("{}{key_segment}", segment.prefix),
            parameters,
            ..segment.clone()
        };

        let mut item = Map::new();
        item.insert("parameters".into(), keyed.parameters.clone().into());
        self.operation_read(ctx, &mut item, segment, restrictions, ByKey::new(true), non_expandable);
        if !root.auto_exposed {
            self.operation_update(ctx, &mut item, segment, restrictions, ByKey::new(true));
            self.operation_delete(ctx, &mut item, segment, restrictions, ByKey::new(true));
        }
        if has_operations(&item) {
            paths.insert(keyed.prefix.clone(), item);
        }
        self.bound_operations(ctx, paths, &keyed, ByKey::new(true));
        self.path_items_with_navigation(ctx, paths, root, &keyed);
    }

    fn path_items_with_navigation(
        &self,
        ctx: &mut Context,
        paths: &mut Paths,
        root: &Root<'a>,
        segment: &Segment<'a>,
    ) {
        let Some(t) = segment.element.type_name().and_then(|t| self.model.element(t)) else {
            return;
        };
        if segment.level >= self.options.max_levels {
            return;
        }
        let root_navigability = root
            .element
            .term_record::<NavigationRestrictions, _>(self.voc, CapabilitiesTerm::NavigationRestrictions)
            .unwrap_or_default();
        let root_navigable = match segment.level {
            0 => root_navigability.navigability() != Some("None"),
            1 => root_navigability.navigability() != Some("Single"),
            _ => true,
        };
        let parent = self.navigation_restrictions(root.element, &segment.navigation_path);
        if parent.navigability() == Some("Single") {
            return;
        }

        let mut navigation = IndexMap::new();
        self.navigation_path_map(t, &mut navigation, "", 0);
        for (name, property) in navigation {
            let navigation_path = if segment.navigation_path.is_empty() {
                name.clone()
            } else {
                format!("{}/{name}", segment.navigation_path)
            };
            let restrictions = self.navigation_restrictions(root.element, &navigation_path);
            let navigable = match restrictions.navigability() {
                Some("Recursive" | "Single") => true,
                Some(_) => false,
                None => root_navigable,
            };
            if !navigable {
                continue;
            }
            let target_set = root.element.navigation_property_binding(&navigation_path);
            let target = target_set.and_then(|set| self.container.and_then(|c| c.element(set)));
            let target_name = target
                .and_then(Element::type_name)
                .and_then(|t| self.model.element(t))
                .and_then(|t| t.label(self.voc))
                .or(target_set)
                .map(ToString::to_string);
            let child = Segment {
                prefix: format!("{}/{name}", segment.prefix),
                parameters: segment.parameters.clone(),
                element: property,
                contains_target: property.contains_target(),
                source_name: segment.source_name.clone(),
                target_name,
                target,
                level: segment.level + 1,
                navigation_path,
            };
            self.path_items(ctx, paths, root, &child);
        }
    }

    /// Navigation properties of a structured type by path, including
    /// those of single-valued structured properties.
    fn navigation_path_map(
        &self,
        t: &'a Element,
        map: &mut IndexMap<String, &'a Element>,
        prefix: &str,
        level: usize,
    ) {
        for (name, property) in self.model.properties(t) {
            if property.kind() == crate::csdl::Kind::NavigationProperty {
                map.insert(format!("{prefix}{name}"), property);
            } else if !property.is_collection() && level < self.options.max_levels {
                if let Some(structured) = property.type_name().and_then(|t| self.model.element(t)) {
                    self.navigation_path_map(structured, map, &format!("{prefix}{name}/"), level + 1);
                }
            }
        }
    }

    fn navigation_restrictions(&self, root: &Element, path: &str) -> NavigationPropertyRestriction {
        root.term_record::<NavigationRestrictions, _>(self.voc, CapabilitiesTerm::NavigationRestrictions)
            .and_then(|r| r.restricted_property(path).cloned())
            .unwrap_or_default()
    }

    fn non_expandable_properties(&self, root: &Element, path: &str) -> Vec<String> {
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };
        root.term_record::<ExpandRestrictions, _>(self.voc, CapabilitiesTerm::ExpandRestrictions)
            .map(|r| {
                r.non_expandable_properties
                    .iter()
                    .filter_map(|p| p.as_str().strip_prefix(prefix.as_str()))
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Key segment and key parameters of an entity type. Parameter
    /// names get the navigation level as suffix below the root.
    ///
    /// A single key is written without its name, `({ID})` or
    /// `('{ID}')` for string keys; composite keys are written as
    /// `(a={a},b='{b}')`. With key-as-segment every key part is its
    /// own segment, `/{ID}`.
    fn entity_key(&self, ctx: &mut Context, t: &'a Element, level: usize) -> (String, Vec<Value>) {
        let Some(keys) = self.model.key_of(t) else {
            return (String::new(), Vec::new());
        };
        let properties = self.model.properties(t);
        let suffix = if level > 0 {
            format!("_{level}")
        } else {
            String::new()
        };
        let untyped = Element::typed(None, false);
        let mut segment = String::new();
        let mut parameters = Vec::new();
        for (index, key) in keys.iter().enumerate() {
            let (name, property) = match key {
                Value::String(name) => (name.as_str(), properties.get(name.as_str()).copied()),
                Value::Object(alias) => match alias.iter().next() {
                    Some((alias, Value::String(path))) => {
                        (alias.as_str(), self.key_property(&properties, path))
                    }
                    _ => continue,
                },
                _ => continue,
            };
            if self.key_as_segment {
                segment.push('/');
            } else {
                if index > 0 {
                    segment.push(',');
                }
                if keys.len() > 1 {
                    segment.push_str(name);
                    segment.push('=');
                }
            }
            let property = property.unwrap_or_else(|| {
                debug!(key = name, "Unknown key property");
                &untyped
            });
            let quote = self.literal_quote(property.type_name());
            segment.push_str(&format!("{quote}{{{name}{suffix}}}{quote}"));
            let description = property
                .any_description(self.voc)
                .map_or_else(|| format!("key: {name}"), ToString::to_string);
            parameters.push(json!({
                "description": description,
                "in": "path",
                "name": format!("{name}{suffix}"),
                "required": true,
                "schema": self.schema(ctx, property, SchemaSuffix::Read, Usage::Parameter)
            }));
        }
        if self.key_as_segment {
            (segment, parameters)
        } else {
            (format!("({segment})"), parameters)
        }
    }

    /// Key property addressed by a path through complex properties.
    fn key_property(&self, properties: &IndexMap<&'a str, &'a Element>, path: &str) -> Option<&'a Element> {
        let mut segments = path.split('/');
        let mut property = segments
            .next()
            .and_then(|first| properties.get(first).copied());
        for segment in segments {
            property = property
                .and_then(Element::type_name)
                .and_then(|t| self.model.element(t))
                .and_then(|t| self.model.properties(t).get(segment).copied());
        }
        property
    }
}
