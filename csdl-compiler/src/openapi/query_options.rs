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

//! Parameters for system query options of read requests.

use crate::csdl::qualified_name::QualifiedName;
use crate::csdl::Element;
use crate::csdl::Kind;
use crate::openapi::Generator;
use crate::vocabulary::annotations::Annotations as _;
use crate::vocabulary::capabilities::CountRestrictions;
use crate::vocabulary::capabilities::ExpandRestrictions;
use crate::vocabulary::capabilities::FilterRestrictions;
use crate::vocabulary::capabilities::NavigationPropertyRestriction;
use crate::vocabulary::capabilities::SearchRestrictions;
use crate::vocabulary::capabilities::SelectSupport;
use crate::vocabulary::capabilities::SortRestrictions;
use crate::vocabulary::CapabilitiesTerm;
use indexmap::IndexMap;
use serde_json::json;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;

pub(crate) const PROTOCOL: &str = "http://docs.oasis-open.org/odata/odata/v4.01/odata-v4.01-part1-protocol.html";

/// Property path while primitive paths are collected.
struct PathEntry<'a> {
    path: String,
    properties: IndexMap<&'a str, &'a Element>,
    /// Complex types on the way to this entry.
    type_chain: Vec<&'a str>,
    complex: bool,
}

fn parameter_reference(name: &str) -> Value {
    json!({ "$ref": format!("#/components/parameters/{name}") })
}

fn enum_array(items: Vec<String>) -> Value {
    json!({
        "type": "array",
        "uniqueItems": true,
        "items": { "type": "string", "enum": items }
    })
}

impl<'a> Generator<'a> {
    /// Parameters shared by all paths in `components/parameters`.
    pub(crate) fn component_parameters(&self) -> Map<String, Value> {
        let prefix = self.query_prefix;
        let mut parameters = Map::new();
        parameters.insert(
            "top".into(),
            json!({
                "name": format!("{prefix}top"),
                "in": "query",
                "description": format!("Show only the first n items, see [Paging - Top]({PROTOCOL}#sec_SystemQueryOptiontop)"),
                "schema": { "type": "integer", "minimum": 0 },
                "example": 50
            }),
        );
        parameters.insert(
            "skip".into(),
            json!({
                "name": format!("{prefix}skip"),
                "in": "query",
                "description": format!("Skip the first n items, see [Paging - Skip]({PROTOCOL}#sec_SystemQueryOptionskip)"),
                "schema": { "type": "integer", "minimum": 0 }
            }),
        );
        parameters.insert(
            "count".into(),
            json!({
                "name": format!("{prefix}count"),
                "in": "query",
                "description": format!("Include count of items, see [Count]({PROTOCOL}#sec_SystemQueryOptioncount)"),
                "schema": { "type": "boolean" }
            }),
        );
        if self.version() >= "4.0" {
            parameters.insert(
                "search".into(),
                json!({
                    "name": format!("{prefix}search"),
                    "in": "query",
                    "description": format!("Search items by search phrases, see [Searching]({PROTOCOL}#sec_SystemQueryOptionsearch)"),
                    "schema": { "type": "string" }
                }),
            );
        }
        parameters
    }

    /// Target restriction term is absent or not `false`.
    fn target_supports(&self, target: Option<&Element>, term: CapabilitiesTerm) -> bool {
        !target.is_some_and(|t| t.term_is_false(self.voc, term))
    }

    pub(crate) fn target_record<R>(&self, target: Option<&Element>, term: CapabilitiesTerm) -> Option<R>
    where
        R: serde::de::DeserializeOwned + Default,
    {
        target.and_then(|t| t.term_record(self.voc, term))
    }

    pub(crate) fn option_top(
        &self,
        parameters: &mut Vec<Value>,
        target: Option<&Element>,
        restrictions: &NavigationPropertyRestriction,
    ) {
        let supported = restrictions
            .top_supported
            .unwrap_or_else(|| self.target_supports(target, CapabilitiesTerm::TopSupported));
        if supported {
            parameters.push(parameter_reference("top"));
        }
    }

    pub(crate) fn option_skip(
        &self,
        parameters: &mut Vec<Value>,
        target: Option<&Element>,
        restrictions: &NavigationPropertyRestriction,
    ) {
        let supported = restrictions
            .skip_supported
            .unwrap_or_else(|| self.target_supports(target, CapabilitiesTerm::SkipSupported));
        if supported {
            parameters.push(parameter_reference("skip"));
        }
    }

    pub(crate) fn option_search(
        &self,
        parameters: &mut Vec<Value>,
        target: Option<&Element>,
        restrictions: &NavigationPropertyRestriction,
    ) {
        let search: SearchRestrictions = restrictions
            .search_restrictions
            .clone()
            .or_else(|| self.target_record(target, CapabilitiesTerm::SearchRestrictions))
            .unwrap_or_default();
        if search.searchable == Some(false) {
            return;
        }
        match search.description(self.voc) {
            Some(description) => parameters.push(json!({
                "name": format!("{}search", self.query_prefix),
                "description": description,
                "in": "query",
                "schema": { "type": "string" }
            })),
            None => parameters.push(parameter_reference("search")),
        }
    }

    pub(crate) fn option_filter(
        &self,
        parameters: &mut Vec<Value>,
        target: Option<&Element>,
        restrictions: &NavigationPropertyRestriction,
    ) {
        let filter: FilterRestrictions = restrictions
            .filter_restrictions
            .clone()
            .or_else(|| self.target_record(target, CapabilitiesTerm::FilterRestrictions))
            .unwrap_or_default();
        if filter.filterable == Some(false) {
            return;
        }
        let mut description = filter.description(self.voc).map_or_else(
            || format!("Filter items by property values, see [Filtering]({PROTOCOL}#sec_SystemQueryOptionfilter)"),
            ToString::to_string,
        );
        if let Some(required_properties) = &filter.required_properties {
            description.push_str("\n\nRequired filter properties:");
            for property in required_properties {
                description.push_str("\n- ");
                description.push_str(property.as_str());
            }
        }
        let mut parameter = Map::new();
        parameter.insert("name".into(), format!("{}filter", self.query_prefix).into());
        parameter.insert("description".into(), description.into());
        parameter.insert("in".into(), "query".into());
        parameter.insert("schema".into(), json!({ "type": "string" }));
        if filter.requires_filter == Some(true) {
            parameter.insert("required".into(), Value::Bool(true));
        }
        parameters.push(Value::Object(parameter));
    }

    pub(crate) fn option_count(&self, parameters: &mut Vec<Value>, target: Option<&Element>) {
        let not_countable = self
            .target_record::<CountRestrictions>(target, CapabilitiesTerm::CountRestrictions)
            .is_some_and(|r| r.is_not_countable());
        if !not_countable {
            parameters.push(parameter_reference("count"));
        }
    }

    pub(crate) fn option_orderby(
        &self,
        parameters: &mut Vec<Value>,
        element: &Element,
        target: Option<&Element>,
        restrictions: &NavigationPropertyRestriction,
    ) {
        let sort: SortRestrictions = restrictions
            .sort_restrictions
            .clone()
            .or_else(|| self.target_record(target, CapabilitiesTerm::SortRestrictions))
            .unwrap_or_default();
        if sort.sortable == Some(false) {
            return;
        }
        let items: Vec<String> = self
            .primitive_paths(element)
            .into_iter()
            .filter(|path| !sort.non_sortable_properties.iter().any(|p| p.as_str() == path))
            .flat_map(|path| {
                let descending = format!("{path} desc");
                [path, descending]
            })
            .collect();
        if items.is_empty() {
            return;
        }
        let description = sort.description(self.voc).map_or_else(
            || format!("Order items by property values, see [Sorting]({PROTOCOL}#sec_SystemQueryOptionorderby)"),
            ToString::to_string,
        );
        parameters.push(json!({
            "name": format!("{}orderby", self.query_prefix),
            "description": description,
            "in": "query",
            "explode": false,
            "schema": enum_array(items)
        }));
    }

    pub(crate) fn option_select(
        &self,
        parameters: &mut Vec<Value>,
        element: &Element,
        target: Option<&Element>,
        restrictions: &NavigationPropertyRestriction,
    ) {
        let select: SelectSupport = restrictions
            .select_support
            .clone()
            .or_else(|| self.target_record(target, CapabilitiesTerm::SelectSupport))
            .unwrap_or_default();
        if select.supported == Some(false) {
            return;
        }
        let items: Vec<String> = element
            .type_name()
            .and_then(|t| self.model.element(t))
            .map(|t| {
                self.model
                    .properties(t)
                    .into_iter()
                    .filter(|(_, p)| p.kind() != Kind::NavigationProperty)
                    .map(|(name, _)| name.to_string())
                    .collect()
            })
            .unwrap_or_default();
        if items.is_empty() {
            return;
        }
        parameters.push(json!({
            "name": format!("{}select", self.query_prefix),
            "description": format!("Select properties to be returned, see [Select]({PROTOCOL}#sec_SystemQueryOptionselect)"),
            "in": "query",
            "explode": false,
            "schema": enum_array(items)
        }));
    }

    pub(crate) fn option_expand(
        &self,
        parameters: &mut Vec<Value>,
        element: &Element,
        target: Option<&Element>,
        non_expandable: &[String],
    ) {
        let expand: Option<ExpandRestrictions> =
            self.target_record(target, CapabilitiesTerm::ExpandRestrictions);
        if expand.as_ref().is_some_and(|r| r.expandable == Some(false)) {
            return;
        }
        let mut items = vec!["*".to_string()];
        items.extend(
            self.navigation_paths(element, "", 0)
                .into_iter()
                .filter(|path| !non_expandable.contains(path)),
        );
        if items.len() < 2 {
            return;
        }
        let description = expand
            .as_ref()
            .and_then(|r| r.description(self.voc))
            .map_or_else(
                || {
                    format!(
                        "The value of $expand query option is a comma-separated list of navigation property names, \
                         stream property names, or $value indicating the stream content of a media-entity. \
                         The corresponding related entities and stream values will be represented inline, \
                         see [Expand]({PROTOCOL}#sec_SystemQueryOptionexpand)"
                    )
                },
                ToString::to_string,
            );
        parameters.push(json!({
            "name": format!("{}expand", self.query_prefix),
            "description": description,
            "in": "query",
            "explode": false,
            "schema": enum_array(items)
        }));
    }

    /// Navigation property paths of the type of an element, including
    /// paths through structured properties.
    fn navigation_paths(&self, element: &Element, prefix: &str, level: usize) -> Vec<String> {
        let Some(t) = element.type_name().and_then(|t| self.model.element(t)) else {
            return Vec::new();
        };
        let mut paths = Vec::new();
        for (name, property) in self.model.properties(t) {
            if property.kind() == Kind::NavigationProperty {
                paths.push(format!("{prefix}{name}"));
            } else if property.type_name().is_some() && level < self.options.max_levels {
                paths.extend(self.navigation_paths(property, &format!("{prefix}{name}/"), level + 1));
            }
        }
        paths
    }

    /// Primitive property paths of the type of an element. Complex
    /// properties are expanded in place. Expansion stops where a complex
    /// type recurs on its own path.
    pub(crate) fn primitive_paths(&self, element: &Element) -> Vec<String> {
        let Some(t) = element.type_name().and_then(|t| self.model.element(t)) else {
            debug!(type_name = element.type_name(), "Unknown type for element");
            return Vec::new();
        };
        let mut entries: Vec<PathEntry<'a>> = self
            .model
            .properties(t)
            .into_iter()
            .filter(|(_, p)| p.kind() != Kind::NavigationProperty)
            .filter(|(name, p)| {
                let unknown = p.type_name().is_some_and(|type_name| {
                    !QualifiedName::parse(type_name).is_edm() && self.model.element(type_name).is_none()
                });
                if unknown {
                    debug!(property = name, type_name = p.type_name(), "Unknown type for element");
                }
                !unknown
            })
            .map(|(name, p)| self.path_entry("", &[], name, p))
            .collect();

        let mut paths = Vec::new();
        let mut i = 0;
        while i < entries.len() {
            let entry = &entries[i];
            if !entry.complex {
                paths.push(entry.path.clone());
                i += 1;
                continue;
            }
            let tail = entry.type_chain.last();
            if entry.type_chain.iter().filter(|t| Some(*t) == tail).count() > 1 {
                debug!(chain = entry.type_chain.join("->"), "Cycle detected");
                i += 1;
                continue;
            }
            let expanded: Vec<PathEntry<'a>> = entry
                .properties
                .iter()
                .filter(|(_, p)| p.kind() != Kind::NavigationProperty)
                .map(|(&name, &p)| self.path_entry(&entry.path, &entry.type_chain, name, p))
                .collect();
            entries.splice(i + 1..i + 1, expanded);
            i += 1;
        }
        paths
    }

    fn path_entry(
        &self,
        parent_path: &str,
        parent_chain: &[&'a str],
        name: &str,
        property: &'a Element,
    ) -> PathEntry<'a> {
        let complex = property.type_name().and_then(|type_name| {
            self.model
                .element(type_name)
                .filter(|t| t.kind() == Kind::ComplexType)
                .map(|t| (type_name, t))
        });
        match complex {
            Some((type_name, t)) => {
                let mut type_chain = parent_chain.to_vec();
                type_chain.push(type_name);
                PathEntry {
                    path: format!("{parent_path}{name}/"),
                    properties: self.model.properties(t),
                    type_chain,
                    complex: true,
                }
            }
            None => PathEntry {
                path: format!("{parent_path}{name}"),
                properties: IndexMap::new(),
                type_chain: Vec::new(),
                complex: false,
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Options;
    use crate::csdl::Document;
    use crate::csdl::Model;

    fn with_generator(csdl: &Value, f: impl FnOnce(&Generator<'_>, &Model)) {
        let model = Model::new(Document::parse(csdl));
        let options = Options::default();
        let generator = Generator::new(&model, &options);
        f(&generator, &model);
    }

    #[test]
    fn test_primitive_paths_expand_complex() {
        let csdl = json!({
            "n": {
                "Order": { "$Kind": "EntityType", "ID": {}, "address": { "$Type": "n.Address" }, "customer": { "$Kind": "NavigationProperty", "$Type": "n.Customer" } },
                "Address": { "$Kind": "ComplexType", "street": {}, "geo": { "$Type": "n.Geo" } },
                "Geo": { "$Kind": "ComplexType", "lat": { "$Type": "Edm.Double" } },
                "Customer": { "$Kind": "EntityType" }
            }
        });
        with_generator(&csdl, |generator, _| {
            let element = Element::typed(Some("n.Order"), true);
            let paths = generator.primitive_paths(&element);
            assert_eq!(paths, ["ID", "address/street", "address/geo/lat"]);
        });
    }

    #[test]
    fn test_primitive_paths_cycle() {
        let csdl = json!({
            "n": {
                "Root": { "$Kind": "EntityType", "ID": {}, "node": { "$Type": "n.Node" } },
                "Node": { "$Kind": "ComplexType", "name": {}, "child": { "$Type": "n.Node" } }
            }
        });
        with_generator(&csdl, |generator, _| {
            let element = Element::typed(Some("n.Root"), true);
            let paths = generator.primitive_paths(&element);
            assert_eq!(paths, ["ID", "node/name"]);
        });
    }

    #[test]
    fn test_unknown_property_type_ignored() {
        let csdl = json!({
            "n": { "T": { "$Kind": "EntityType", "ID": {}, "other": { "$Type": "x.Missing" } } }
        });
        with_generator(&csdl, |generator, _| {
            let element = Element::typed(Some("n.T"), true);
            assert_eq!(generator.primitive_paths(&element), ["ID"]);
        });
    }

    #[test]
    fn test_filter_required_properties() {
        let csdl = json!({
            "$Reference": {
                "https://oasis-tcs.github.io/odata-vocabularies/vocabularies/Org.OData.Capabilities.V1.json": {
                    "$Include": [{ "$Namespace": "Org.OData.Capabilities.V1", "$Alias": "Capabilities" }]
                }
            },
            "n": {
                "Service": {
                    "$Kind": "EntityContainer",
                    "S": {
                        "$Collection": true,
                        "$Type": "n.T",
                        "@Capabilities.FilterRestrictions": {
                            "RequiresFilter": true,
                            "RequiredProperties": ["year"]
                        }
                    }
                }
            }
        });
        with_generator(&csdl, |generator, model| {
            let target = model.element("n.Service").and_then(|c| c.element("S"));
            let mut parameters = Vec::new();
            generator.option_filter(&mut parameters, target, &NavigationPropertyRestriction::default());
            assert_eq!(parameters[0]["required"], true);
            assert_eq!(
                parameters[0]["description"],
                format!("Filter items by property values, see [Filtering]({PROTOCOL}#sec_SystemQueryOptionfilter)\n\nRequired filter properties:\n- year")
            );
        });
    }
}
