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

//! CSDL JSON documents and the model built from them.

/// Parsed CSDL JSON document.
pub mod document;
/// Model elements.
pub mod element;
/// Preprocessed model with lookup by qualified name.
pub mod model;
mod preprocess;
/// Qualified names and identifiers.
pub mod qualified_name;

pub use document::Document;
pub use element::Element;
pub use element::Kind;
pub use element::Member;
pub use model::Model;
