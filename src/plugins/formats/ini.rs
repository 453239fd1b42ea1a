//! Line-preserving INI documents.
//!
//! GTK, Kvantum and Konsole keep their settings in INI-style files. Only the
//! entry being changed is rewritten; comments, blank lines, ordering and
//! spacing around untouched entries survive a round trip.

/// One physical line of an INI document.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Section { name: String, raw: String },
    Entry { key: String, raw: String },
    Other(String),
}

impl Line {
    fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Some(inner) = trimmed.strip_prefix('[')
            && let Some(name) = inner.strip_suffix(']')
        {
            return Line::Section {
                name: name.trim().to_string(),
                raw: raw.to_string(),
            };
        }

        if !trimmed.starts_with(['#', ';'])
            && let Some((key, _)) = trimmed.split_once('=')
        {
            return Line::Entry {
                key: key.trim().to_string(),
                raw: raw.to_string(),
            };
        }

        Line::Other(raw.to_string())
    }

    fn raw(&self) -> &str {
        match self {
            Line::Section { raw, .. } | Line::Entry { raw, .. } | Line::Other(raw) => raw,
        }
    }
}

/// A parsed INI document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    lines: Vec<Line>,
}

impl IniDocument {
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.lines().map(Line::parse).collect(),
        }
    }

    /// Index range of the body of every `[section]` block with this name.
    ///
    /// Entries before the first header belong to the unnamed section `""`.
    fn section_bodies(&self, section: &str) -> Vec<(usize, usize)> {
        let mut bodies = Vec::new();
        let mut current: Option<(bool, usize)> = Some((section.is_empty(), 0));

        for (index, line) in self.lines.iter().enumerate() {
            if let Line::Section { name, .. } = line {
                if let Some((true, start)) = current {
                    bodies.push((start, index));
                }
                current = Some((name == section, index + 1));
            }
        }
        if let Some((true, start)) = current {
            bodies.push((start, self.lines.len()));
        }

        bodies
    }

    /// Value of `key` in `section`, the first occurrence winning.
    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        self.section_bodies(section)
            .into_iter()
            .flat_map(|(start, end)| self.lines[start..end].iter())
            .find_map(|line| match line {
                Line::Entry { key: k, raw } if k == key => raw
                    .split_once('=')
                    .map(|(_, value)| value.trim().to_string()),
                _ => None,
            })
    }

    /// Set `key` in `section` to `value`.
    ///
    /// The first existing entry is replaced in place and any duplicates of it
    /// in the same section are dropped. A missing key is inserted after the
    /// section's last entry; a missing section is appended to the document.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        let entry = Line::Entry {
            key: key.to_string(),
            raw: format!("{key}={value}"),
        };
        let bodies = self.section_bodies(section);

        let matching: Vec<usize> = bodies
            .iter()
            .flat_map(|&(start, end)| start..end)
            .filter(|&i| matches!(&self.lines[i], Line::Entry { key: k, .. } if k == key))
            .collect();

        if let Some((&first, duplicates)) = matching.split_first() {
            self.lines[first] = entry;
            for &index in duplicates.iter().rev() {
                self.lines.remove(index);
            }
            return;
        }

        if let Some(&(start, end)) = bodies.first() {
            let insert_at = (start..end)
                .rev()
                .find(|&i| matches!(self.lines[i], Line::Entry { .. }))
                .map_or(start, |i| i + 1);
            self.lines.insert(insert_at, entry);
            return;
        }

        if self
            .lines
            .last()
            .is_some_and(|line| !line.raw().trim().is_empty())
        {
            self.lines.push(Line::Other(String::new()));
        }
        self.lines.push(Line::Section {
            name: section.to_string(),
            raw: format!("[{section}]"),
        });
        self.lines.push(entry);
    }

    /// Names of every section header, in document order.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|line| match line {
            Line::Section { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }

    /// Serialize the document, ending with a newline.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for line in &self.lines {
            text.push_str(line.raw());
            text.push('\n');
        }
        text
    }
}

/// Set one key in INI text and return the rewritten text.
pub fn set_key(text: &str, section: &str, key: &str, value: &str) -> String {
    let mut document = IniDocument::parse(text);
    document.set(section, key, value);
    document.to_text()
}
