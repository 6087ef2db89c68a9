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

use std::cmp::Ordering;

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Split a camel-cased name into words. Acronyms are kept, other words
/// are lowercased: `HTTPServerForXML` becomes `HTTP server for XML`.
#[must_use]
pub fn camel_case_to_words(name: &str) -> String {
    let chars: Vec<char> = name.replace('_', " ").chars().collect();

    let mut split = Vec::with_capacity(chars.len() + 4);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match chars.get(i + 1) {
            Some(&next)
                if (c.is_ascii_lowercase() || c.is_ascii_digit()) && next.is_ascii_uppercase() =>
            {
                split.extend([c, ' ', next]);
                i += 2;
            }
            _ => {
                split.push(c);
                i += 1;
            }
        }
    }

    let chars = split;
    let mut split = Vec::with_capacity(chars.len() + 4);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let acronym_end = c.is_ascii_uppercase()
            && chars.get(i + 1).is_some_and(char::is_ascii_uppercase)
            && chars.get(i + 2).is_some_and(char::is_ascii_lowercase);
        if acronym_end {
            split.extend([c, ' ', chars[i + 1]]);
            i += 2;
        } else {
            split.push(c);
            i += 1;
        }
    }

    let mut chars = split;
    let boundary_before = |chars: &[char], i: usize| i == 0 || !is_word(chars[i - 1]);
    for i in 0..chars.len() {
        if chars[i].is_ascii_uppercase()
            && boundary_before(&chars, i)
            && chars.get(i + 1).is_some_and(char::is_ascii_lowercase)
        {
            chars[i] = chars[i].to_ascii_lowercase();
        }
    }
    for i in 0..chars.len() {
        if chars[i].is_ascii_uppercase()
            && boundary_before(&chars, i)
            && !chars.get(i + 1).is_some_and(|c| is_word(*c))
        {
            chars[i] = chars[i].to_ascii_lowercase();
        }
    }
    chars.into_iter().collect()
}

/// Tag name: underscores become spaces and camel case is split.
#[must_use]
pub fn normalise_tag(tag: &str) -> String {
    let mut normalised = String::with_capacity(tag.len() + 4);
    let mut previous = None;
    for c in tag.chars() {
        let c = if c == '_' { ' ' } else { c };
        if previous.is_some_and(|p: char| p.is_ascii_lowercase()) && c.is_ascii_uppercase() {
            normalised.push(' ');
        }
        normalised.push(c);
        previous = Some(c);
    }
    normalised
}

/// Order of tags: case-insensitive, ties broken by exact comparison.
#[must_use]
pub fn compare_tags(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

const IRREGULAR: &[(&str, &str)] = &[
    ("people", "person"),
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("feet", "foot"),
    ("teeth", "tooth"),
];

const UNCOUNTABLE: &[&str] = &[
    "news",
    "series",
    "species",
    "information",
    "equipment",
    "data",
    "metadata",
];

/// Singular of the last word of an English phrase. The case of the
/// first letter of the word is kept.
#[must_use]
pub fn singular(phrase: &str) -> String {
    let start = phrase.rfind(' ').map_or(0, |pos| pos + 1);
    let (head, word) = phrase.split_at(start);
    let lower = word.to_ascii_lowercase();
    if UNCOUNTABLE.contains(&lower.as_str()) {
        return phrase.to_string();
    }
    if let Some((_, single)) = IRREGULAR.iter().find(|(plural, _)| *plural == lower) {
        let mut single = (*single).to_string();
        if word.starts_with(|c: char| c.is_ascii_uppercase()) {
            single[..1].make_ascii_uppercase();
        }
        return format!("{head}{single}");
    }
    if lower.len() > 3 && lower.ends_with("ies") {
        let y = if word.ends_with("IES") { "Y" } else { "y" };
        return format!("{head}{}{y}", &word[..word.len() - 3]);
    }
    let stem_len = if ["sses", "shes", "ches", "xes", "zzes"]
        .iter()
        .any(|suffix| lower.ends_with(suffix))
    {
        word.len() - 2
    } else if ["ss", "us", "is"].iter().any(|suffix| lower.ends_with(suffix)) {
        word.len()
    } else if lower.len() > 1 && lower.ends_with('s') {
        word.len() - 1
    } else {
        word.len()
    };
    format!("{head}{}", &word[..stem_len])
}
