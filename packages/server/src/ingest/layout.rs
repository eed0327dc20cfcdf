use super::category::Category;

/// Object path prefix of one component: `{period}/{cm}/{sku}/{component}`.
///
/// Segments are validated as flat names before a prefix is built, so joining
/// them with `/` never produces traversal or empty segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPrefix {
    base: String,
}

impl ObjectPrefix {
    pub fn new(period: &str, cm_code: &str, sku_code: &str, component_code: &str) -> Self {
        Self {
            base: format!("{period}/{cm_code}/{sku_code}/{component_code}"),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.base
    }

    pub fn object_path(&self, category: Category, name: &str) -> String {
        format!("{}/{}/{}", self.base, category.label(), name)
    }
}
