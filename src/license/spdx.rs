/// Permissive licenses.
pub const SAFE: &[&str] = &[
    "MIT",
    "MIT-0",
    "Apache-2.0",
    "Apache-1.1",
    "BSD",
    "BSD-2-Clause",
    "BSD-3-Clause",
    "BSD-4-Clause",
    "0BSD",
    "ISC",
    "Zlib",
    "Unlicense",
    "CC0-1.0",
    "WTFPL",
    "CC-BY-3.0",
    "CC-BY-4.0",
    "PSF-2.0",
    "Python-2.0",
    "BlueOak-1.0.0",
    "BSL-1.0",
    "Artistic-2.0",
];

/// Strong copyleft licenses that force derived work to be open sourced.
pub const HIGH_RISK: &[&str] = &[
    "GPL",
    "GPL-2.0",
    "GPL-2.0-only",
    "GPL-2.0-or-later",
    "GPL-2.0+",
    "GPL-3.0",
    "GPL-3.0-only",
    "GPL-3.0-or-later",
    "GPL-3.0+",
    "AGPL",
    "AGPL-1.0",
    "AGPL-3.0",
    "AGPL-3.0-only",
    "AGPL-3.0-or-later",
    "EUPL-1.1",
];

/// Weak copyleft and source-available licenses.
pub const RISKY: &[&str] = &[
    "LGPL",
    "LGPL-2.0",
    "LGPL-2.0-only",
    "LGPL-2.0-or-later",
    "LGPL-2.1",
    "LGPL-2.1-only",
    "LGPL-2.1-or-later",
    "LGPL-3.0",
    "LGPL-3.0-only",
    "LGPL-3.0-or-later",
    "MPL-1.1",
    "MPL-2.0",
    "EPL-1.0",
    "EPL-2.0",
    "CDDL-1.0",
    "CDDL-1.1",
    "EUPL-1.2",
    "APSL-2.0",
    "OSL-3.0",
    "SSPL-1.0",
    "Elastic-2.0",
    "BUSL-1.1",
];

/// Normalize common non-SPDX spellings to their SPDX equivalents.
///
/// Covers the names Maven POMs and PyPI trove classifiers typically carry.
/// Anything unrecognized is returned trimmed and otherwise untouched.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed {
        "Apache 2.0"
        | "Apache 2"
        | "Apache-2"
        | "Apache License 2.0"
        | "Apache License, Version 2.0"
        | "Apache License Version 2.0"
        | "The Apache License, Version 2.0"
        | "The Apache Software License, Version 2.0"
        | "Apache Software License" => "Apache-2.0".to_string(),
        "MIT License" | "The MIT License" | "The MIT License (MIT)" | "MIT license" => {
            "MIT".to_string()
        }
        "BSD License" => "BSD".to_string(),
        "BSD 2-Clause" | "Simplified BSD" | "The BSD 2-Clause License" => {
            "BSD-2-Clause".to_string()
        }
        "BSD 3-Clause" | "New BSD" | "Modified BSD" | "New BSD License"
        | "The BSD 3-Clause License" => "BSD-3-Clause".to_string(),
        "GNU GPL v2" | "GNU General Public License v2" | "GPL v2" | "GPLv2"
        | "GNU General Public License v2 (GPLv2)" => "GPL-2.0".to_string(),
        "GNU GPL v3" | "GNU General Public License v3" | "GPL v3" | "GPLv3"
        | "GNU General Public License v3 (GPLv3)" => "GPL-3.0".to_string(),
        "GNU General Public License (GPL)" => "GPL".to_string(),
        "GNU LGPL v2.1" | "LGPL v2.1" | "LGPLv2.1"
        | "GNU Lesser General Public License, Version 2.1" => "LGPL-2.1".to_string(),
        "GNU LGPL v3" | "LGPL v3" | "LGPLv3"
        | "GNU Lesser General Public License v3 (LGPLv3)" => "LGPL-3.0".to_string(),
        "GNU Lesser General Public License (LGPL)" | "GNU Lesser General Public License" => {
            "LGPL".to_string()
        }
        "Mozilla Public License 2.0" | "MPL 2.0" | "MPLv2"
        | "Mozilla Public License 2.0 (MPL 2.0)" => "MPL-2.0".to_string(),
        "Eclipse Public License 1.0" | "Eclipse Public License - v 1.0" => {
            "EPL-1.0".to_string()
        }
        "Eclipse Public License 2.0" | "Eclipse Public License - v 2.0"
        | "Eclipse Public License v2.0" => "EPL-2.0".to_string(),
        "CDDL" | "COMMON DEVELOPMENT AND DISTRIBUTION LICENSE (CDDL) Version 1.0" => {
            "CDDL-1.0".to_string()
        }
        "Server Side Public License" | "SSPL" => "SSPL-1.0".to_string(),
        "Elastic License 2.0" | "Elastic" => "Elastic-2.0".to_string(),
        "ISC License" | "ISC License (ISCL)" => "ISC".to_string(),
        "CC0" | "Public Domain" => "CC0-1.0".to_string(),
        "AGPL v3" | "AGPLv3" | "GNU AGPL v3"
        | "GNU Affero General Public License v3" => "AGPL-3.0".to_string(),
        "Python Software Foundation License" => "PSF-2.0".to_string(),
        other => other.to_string(),
    }
}

/// Split an SPDX-style expression into its component identifiers.
///
/// Separators are ` OR ` and ` AND ` (case-sensitive); surrounding
/// parentheses are stripped from each part, and empty parts dropped.
pub fn split_expression(expr: &str) -> Vec<String> {
    expr.split(" OR ")
        .flat_map(|p| p.split(" AND "))
        .map(|p| {
            p.trim()
                .trim_matches(|c| c == '(' || c == ')')
                .trim()
                .to_string()
        })
        .filter(|p| !p.is_empty())
        .collect()
}

/// Strip a trailing `WITH <exception>` clause.
pub fn base_license(id: &str) -> &str {
    id.split(" WITH ").next().unwrap_or(id).trim()
}
