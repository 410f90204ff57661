use std::fmt;

use super::subject::EvaluationContext;
use super::value::Value;

/// A condition's field reference, resolved once when the rule is compiled.
///
/// The well-known product, customer and quantity paths are closed variants.
/// Every other dot path is an [`Extension`](FieldPath::Extension) lookup into
/// the call's extension attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldPath {
    ProductId,
    ProductCategoryId,
    ProductBrandId,
    ProductPrice,
    CustomerId,
    CustomerGroupId,
    CustomerGroupCode,
    Quantity,
    Extension(String),
}

impl FieldPath {
    /// Resolve a dot path. Never fails: unknown paths become extension lookups.
    /// A leading `context.` segment addresses the extension map explicitly.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        match path.trim() {
            "product.id" => FieldPath::ProductId,
            "product.category_id" => FieldPath::ProductCategoryId,
            "product.brand_id" => FieldPath::ProductBrandId,
            "product.price" => FieldPath::ProductPrice,
            "customer.id" => FieldPath::CustomerId,
            "customer.group_id" => FieldPath::CustomerGroupId,
            "customer.group_code" | "customer.group" => FieldPath::CustomerGroupCode,
            "quantity" => FieldPath::Quantity,
            other => {
                let key = other.strip_prefix("context.").unwrap_or(other);
                FieldPath::Extension(key.to_owned())
            }
        }
    }

    /// Look the field up in the context. `None` is the absent sentinel.
    #[must_use]
    pub fn resolve(&self, ctx: &EvaluationContext<'_>) -> Option<Value> {
        let product = ctx.product();
        match self {
            FieldPath::ProductId => Some(Value::Int(product.id)),
            FieldPath::ProductCategoryId => product.category_id.map(Value::Int),
            FieldPath::ProductBrandId => product.brand_id.map(Value::Int),
            FieldPath::ProductPrice => Some(Value::Decimal(product.price)),
            FieldPath::CustomerId => ctx.customer().map(|c| Value::Int(c.id)),
            FieldPath::CustomerGroupId => ctx.customer().and_then(|c| c.group_id).map(Value::Int),
            FieldPath::CustomerGroupCode => ctx
                .customer()
                .and_then(|c| c.group_code.clone())
                .map(Value::String),
            FieldPath::Quantity => Some(Value::Int(i64::from(ctx.quantity()))),
            FieldPath::Extension(key) => ctx.extensions().get(key).cloned(),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            FieldPath::ProductId => "product.id",
            FieldPath::ProductCategoryId => "product.category_id",
            FieldPath::ProductBrandId => "product.brand_id",
            FieldPath::ProductPrice => "product.price",
            FieldPath::CustomerId => "customer.id",
            FieldPath::CustomerGroupId => "customer.group_id",
            FieldPath::CustomerGroupCode => "customer.group_code",
            FieldPath::Quantity => "quantity",
            FieldPath::Extension(key) => key,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
