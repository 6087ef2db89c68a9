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

//! Entity data model diagram in yUML class notation, rendered as an
//! image by <https://yuml.me>.

use crate::csdl::qualified_name::simple_name;
use crate::csdl::qualified_name::QualifiedName;
use crate::csdl::Element;
use crate::csdl::Kind;
use crate::openapi::Generator;
use tracing::debug;

const RESOURCE_COLOR: &str = "{bg:lawngreen}";
const ENTITY_TYPE_COLOR: &str = "{bg:lightslategray}";
const COMPLEX_TYPE_COLOR: &str = "";
const EXTERNAL_COLOR: &str = "{bg:whitesmoke}";

fn cardinality(element: &Element) -> &'static str {
    if element.is_collection() {
        "*"
    } else if element.is_nullable() {
        "0..1"
    } else {
        ""
    }
}

/// Diagram text under construction. Boxes after the first one are
/// separated by commas.
#[derive(Default)]
struct Diagram {
    text: String,
    comma: &'static str,
}

impl Generator<'_> {
    /// Markdown section with the diagram of all structured types and
    /// the container resources. Empty if there is nothing to draw.
    pub(crate) fn diagram(&self, container: &Element) -> String {
        let mut d = Diagram::default();
        for (_, schema) in self.model.schemas() {
            for (type_name, t) in schema.elements() {
                let color = match t.kind() {
                    Kind::EntityType => ENTITY_TYPE_COLOR,
                    Kind::ComplexType => COMPLEX_TYPE_COLOR,
                    _ => continue,
                };
                d.text.push_str(d.comma);
                if let Some(base) = t.base_type() {
                    d.text.push_str(&format!("[{}]^", simple_name(base)));
                }
                d.text.push_str(&format!("[{type_name}{color}]"));
                for (property_name, property) in t.elements() {
                    self.property_diagram(&mut d, type_name, property_name, property);
                }
                d.comma = ",";
            }
        }

        let resources: Vec<_> = container.elements().collect();
        for (name, resource) in resources.into_iter().rev() {
            if let Some(type_name) = resource.type_name() {
                // Space after the name keeps set and type apart if they share a name.
                d.text.push_str(&format!(
                    "{}[{name}%20{RESOURCE_COLOR}]++-{}>[{}]",
                    d.comma,
                    cardinality(resource),
                    simple_name(type_name)
                ));
            } else if let Some(action) = resource.action() {
                d.text.push_str(&format!("{}[{name}{RESOURCE_COLOR}]", d.comma));
                match self
                    .model
                    .overloads(action)
                    .and_then(|overloads| overloads.iter().find(|o| !o.is_bound()))
                {
                    Some(overload) => self.overload_diagram(&mut d, name, overload),
                    None => debug!(name, action, "Unknown action in action import"),
                }
            } else if let Some(function) = resource.function() {
                d.text.push_str(&format!("{}[{name}{RESOURCE_COLOR}]", d.comma));
                if let Some(overload) = self
                    .model
                    .overloads(function)
                    .and_then(|overloads| overloads.iter().find(|o| !o.is_bound()))
                {
                    self.overload_diagram(&mut d, name, overload);
                }
            }
        }

        if d.text.is_empty() {
            return String::new();
        }
        format!(
            "\n\n## Entity Data Model\n![ER Diagram](https://yuml.me/diagram/class/{})\n\n### Legend\n\
             ![Legend](https://yuml.me/diagram/plain;dir:TB;scale:60/class/[External.Type{EXTERNAL_COLOR}],\
             [ComplexType{COMPLEX_TYPE_COLOR}],[EntityType{ENTITY_TYPE_COLOR}],\
             [EntitySet/Singleton/Operation{RESOURCE_COLOR}])",
            d.text
        )
    }

    /// Association of a navigation property or a property of a
    /// non-primitive type. Of two partners only the one with the
    /// smaller name is drawn.
    fn property_diagram(&self, d: &mut Diagram, type_name: &str, property_name: &str, property: &Element) {
        let property_type = property.type_name().unwrap_or("Edm.String");
        let navigation = property.kind() == Kind::NavigationProperty;
        if !navigation && QualifiedName::parse(property_type).is_edm() {
            return;
        }
        let target = self.model.element(property_type);
        let partner = property
            .partner()
            .and_then(|partner| Some((partner, target?.element(partner)?)))
            .filter(|(_, p)| p.partner() == Some(property_name));
        if partner.is_some_and(|(name, _)| property_name > name) {
            return;
        }
        let source_end = if !navigation || property.contains_target() {
            "++"
        } else {
            partner.map_or("", |(_, p)| cardinality(p))
        };
        let arrow = if !navigation || partner.is_some() { "" } else { ">" };
        let target_box = if target.is_some() {
            simple_name(property_type).to_string()
        } else {
            format!("{property_type}{EXTERNAL_COLOR}")
        };
        d.text.push_str(&format!(
            ",[{type_name}]{source_end}-{}{arrow}[{target_box}]",
            cardinality(property)
        ));
    }

    fn overload_diagram(&self, d: &mut Diagram, name: &str, overload: &Element) {
        if let Some(return_type) = overload.return_type() {
            let type_name = return_type.type_name().unwrap_or("Edm.String");
            if self.model.element(type_name).is_some() {
                d.text.push_str(&format!(
                    "-{}>[{}]",
                    cardinality(return_type),
                    simple_name(type_name)
                ));
            }
        }
        for parameter in overload.parameters() {
            let type_name = parameter.type_name().unwrap_or("Edm.String");
            if self.model.element(type_name).is_some() {
                d.text.push_str(&format!(
                    "{}[{name}{RESOURCE_COLOR}]in-{}>[{}]",
                    d.comma,
                    cardinality(parameter),
                    simple_name(type_name)
                ));
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Options;
    use crate::openapi::test::generate_with;
    use serde_json::json;

    #[test]
    fn test_diagram() {
        let options = Options {
            diagram: true,
            ..Options::default()
        };
        let openapi = generate_with(
            &json!({
                "$EntityContainer": "self.Container",
                "self": {
                    "Customer": {
                        "$Kind": "EntityType",
                        "$Key": ["ID"],
                        "ID": {},
                        "orders": {
                            "$Kind": "NavigationProperty",
                            "$Type": "self.Order",
                            "$Collection": true,
                            "$Partner": "customer"
                        }
                    },
                    "Order": {
                        "$Kind": "EntityType",
                        "$Key": ["ID"],
                        "ID": {},
                        "customer": {
                            "$Kind": "NavigationProperty",
                            "$Type": "self.Customer",
                            "$Nullable": true,
                            "$Partner": "orders"
                        },
                        "address": { "$Type": "self.Address" }
                    },
                    "Address": { "$Kind": "ComplexType", "street": {} },
                    "Container": {
                        "$Kind": "EntityContainer",
                        "Customers": { "$Type": "self.Customer", "$Collection": true },
                        "Orders": { "$Type": "self.Order", "$Collection": true }
                    }
                }
            }),
            &options,
        );
        let description = openapi["info"]["description"].as_str().expect("description");
        let expected = "[Customer{bg:lightslategray}],\
                        [Order{bg:lightslategray}],[Order]*-0..1[Customer],[Order]++-[Address],\
                        [Address],\
                        [Orders%20{bg:lawngreen}]++-*>[Order],\
                        [Customers%20{bg:lawngreen}]++-*>[Customer]";
        assert!(description.contains(&format!("![ER Diagram](https://yuml.me/diagram/class/{expected})")));
        assert!(description.contains("### Legend"));
    }
}
