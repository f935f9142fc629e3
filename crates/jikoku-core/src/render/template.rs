//! Flex Message card templates
//!
//! テンプレートは起動時に一度だけ読み込まれ、全リクエストで共有されます。
//! 書き換えは必ず `FlexCard` (シェルの複製) に対して行い、テンプレート自体は変更しません。

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::config::DesignConfig;
use crate::{Error, Result};

const BUNDLED_SHELL: &str = include_str!("../../assets/design/flex_message.json");
const BUNDLED_ROW: &str = include_str!("../../assets/design/body_contents_box.json");
const BUNDLED_SEPARATOR: &str = include_str!("../../assets/design/body_contents_separator.json");

pub const SHELL_FILE: &str = "flex_message.json";
pub const ROW_FILE: &str = "body_contents_box.json";
pub const SEPARATOR_FILE: &str = "body_contents_separator.json";

// JSON pointers into the shell
const HEADER_START_TEXT: &str = "/header/contents/0/contents/0/text";
const HEADER_END_TEXT: &str = "/header/contents/2/contents/0/text";
const BODY_CONTENTS: &str = "/body/contents";
const FOOTER_LINK: &str = "/footer/contents/0/action/uri";

// JSON pointers into a row
const ROW_ICON_URL: &str = "/contents/0/contents/0/url";
const ROW_TEXT: &str = "/contents/0/contents/1/text";

/// Card shell, row and separator blueprints
#[derive(Debug, Clone)]
pub struct CardTemplate {
    shell: Value,
    row: Value,
    separator: Value,
}

impl CardTemplate {
    /// Build from parsed documents, checking every field the renderer writes to.
    pub fn from_values(shell: Value, row: Value, separator: Value) -> Result<Self> {
        for pointer in [HEADER_START_TEXT, HEADER_END_TEXT, FOOTER_LINK] {
            require_string(&shell, pointer, SHELL_FILE)?;
        }
        if !matches!(shell.pointer(BODY_CONTENTS), Some(Value::Array(_))) {
            return Err(Error::Template(format!(
                "{}: {} must be an array",
                SHELL_FILE, BODY_CONTENTS
            )));
        }

        for pointer in [ROW_ICON_URL, ROW_TEXT] {
            require_string(&row, pointer, ROW_FILE)?;
        }

        if !separator.is_object() {
            return Err(Error::Template(format!("{}: expected an object", SEPARATOR_FILE)));
        }

        Ok(Self {
            shell,
            row,
            separator,
        })
    }

    /// Templates shipped with the crate
    pub fn bundled() -> Result<Self> {
        Self::from_values(
            serde_json::from_str(BUNDLED_SHELL)?,
            serde_json::from_str(BUNDLED_ROW)?,
            serde_json::from_str(BUNDLED_SEPARATOR)?,
        )
    }

    /// Load the three template files from `dir`
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        debug!("Loading card templates from: {}", dir.display());

        let read = |name: &str| -> Result<Value> {
            let content = std::fs::read_to_string(dir.join(name))?;
            Ok(serde_json::from_str(&content)?)
        };

        Self::from_values(read(SHELL_FILE)?, read(ROW_FILE)?, read(SEPARATOR_FILE)?)
    }

    /// 設定に従って読み込む (未指定なら同梱テンプレート)
    pub fn load(config: &DesignConfig) -> Result<Self> {
        match &config.template_dir {
            Some(dir) => Self::load_dir(dir),
            None => Self::bundled(),
        }
    }

    /// Fresh copy of the shell to fill in
    pub fn card(&self) -> FlexCard {
        FlexCard {
            doc: self.shell.clone(),
            has_footer_link: false,
        }
    }

    /// Fresh row block with its icon and text set
    pub fn row(&self, icon_url: &str, text: &str) -> Value {
        let mut row = self.row.clone();
        set_string(&mut row, ROW_ICON_URL, icon_url);
        set_string(&mut row, ROW_TEXT, text);
        row
    }

    /// Fresh separator block
    pub fn separator(&self) -> Value {
        self.separator.clone()
    }

    pub fn shell(&self) -> &Value {
        &self.shell
    }
}

/// A card being filled in. Owns its own copy of the shell.
#[derive(Debug, Clone)]
pub struct FlexCard {
    doc: Value,
    has_footer_link: bool,
}

impl FlexCard {
    pub fn set_header_start(&mut self, text: &str) -> &mut Self {
        set_string(&mut self.doc, HEADER_START_TEXT, text);
        self
    }

    pub fn set_header_end(&mut self, text: &str) -> &mut Self {
        set_string(&mut self.doc, HEADER_END_TEXT, text);
        self
    }

    pub fn append_row(&mut self, row: Value) -> &mut Self {
        self.push_body(row);
        self
    }

    pub fn append_separator(&mut self, separator: Value) -> &mut Self {
        self.push_body(separator);
        self
    }

    pub fn set_footer_link(&mut self, uri: &str) -> &mut Self {
        set_string(&mut self.doc, FOOTER_LINK, uri);
        self.has_footer_link = true;
        self
    }

    /// Finished document. The footer is dropped when no link was set.
    pub fn into_value(mut self) -> Value {
        if !self.has_footer_link {
            if let Some(obj) = self.doc.as_object_mut() {
                obj.remove("footer");
            }
        }
        self.doc
    }

    fn push_body(&mut self, block: Value) {
        if let Some(Value::Array(contents)) = self.doc.pointer_mut(BODY_CONTENTS) {
            contents.push(block);
        }
    }
}

fn require_string(doc: &Value, pointer: &str, file: &str) -> Result<()> {
    match doc.pointer(pointer) {
        Some(Value::String(_)) => Ok(()),
        _ => Err(Error::Template(format!("{}: missing string field {}", file, pointer))),
    }
}

fn set_string(doc: &mut Value, pointer: &str, text: &str) {
    if let Some(slot) = doc.pointer_mut(pointer) {
        *slot = Value::String(text.to_string());
    }
}
