//! Normalization of product-picker payloads into typed selections.
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::gid::ProductId;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PickerImage {
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "originalSrc")]
    pub original_src: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PickerProduct {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub images: Vec<PickerImage>,
    #[serde(default, rename = "featuredImage")]
    pub featured_image: Option<PickerImage>,
    #[serde(default)]
    pub image: Option<PickerImage>,
}

/// The payload shapes the host picker is known to return.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PickerPayload {
    Products { products: Vec<PickerProduct> },
    Selection { selection: Vec<PickerProduct> },
    List(Vec<PickerProduct>),
}

impl PickerPayload {
    fn into_products(self) -> Vec<PickerProduct> {
        match self {
            PickerPayload::Products { products } => products,
            PickerPayload::Selection { selection } => selection,
            PickerPayload::List(list) => list,
        }
    }
}

/// A picked product with its id already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedProduct {
    pub id: ProductId,
    pub title: String,
    pub image_url: Option<String>,
}

impl PickerProduct {
    /// First non-empty image URL, in order: images[0] (src, url, originalSrc),
    /// featuredImage (originalSrc, url), image.src.
    pub fn image_url(&self) -> Option<String> {
        let first = self.images.first();
        let featured = self.featured_image.as_ref();
        [
            first.and_then(|i| i.src.as_ref()),
            first.and_then(|i| i.url.as_ref()),
            first.and_then(|i| i.original_src.as_ref()),
            featured.and_then(|i| i.original_src.as_ref()),
            featured.and_then(|i| i.url.as_ref()),
            self.image.as_ref().and_then(|i| i.src.as_ref()),
        ]
        .into_iter()
        .flatten()
        .find(|u| !u.is_empty())
        .cloned()
    }
}

pub fn normalize_picker_payload(payload: Value) -> Result<Vec<PickedProduct>, ApiError> {
    let shape = describe(&payload);
    let parsed: PickerPayload = serde_json::from_value(payload)
        .map_err(|_| ApiError::UnrecognizedPickerPayload(shape))?;
    parsed
        .into_products()
        .into_iter()
        .map(|p| {
            Ok(PickedProduct {
                id: ProductId::parse(&p.id)?,
                image_url: p.image_url(),
                title: p.title,
            })
        })
        .collect()
}

fn describe(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("object with keys [{}]", keys.join(", "))
        }
        Value::Array(_) => "array".into(),
        Value::Null => "null".into(),
        other => format!("{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_all_known_shapes() {
        let product = json!({ "id": "gid://shopify/Product/11", "title": "Hat" });
        for payload in [
            json!({ "products": [product.clone()] }),
            json!({ "selection": [product.clone()] }),
            json!([product.clone()]),
        ] {
            let picked = normalize_picker_payload(payload).unwrap();
            assert_eq!(picked.len(), 1);
            assert_eq!(picked[0].id, ProductId::new(11));
            assert_eq!(picked[0].title, "Hat");
        }
    }

    #[test]
    fn rejects_unknown_shapes() {
        let err = normalize_picker_payload(json!({ "items": [] })).unwrap_err();
        match err {
            ApiError::UnrecognizedPickerPayload(msg) => assert!(msg.contains("items")),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(normalize_picker_payload(json!("nope")).is_err());
    }

    #[test]
    fn image_priority() {
        let payload = json!([{
            "id": "gid://shopify/Product/1",
            "featuredImage": { "originalSrc": "https://cdn/featured.jpg" },
            "image": { "src": "https://cdn/image.jpg" }
        }]);
        let picked = normalize_picker_payload(payload).unwrap();
        assert_eq!(picked[0].image_url.as_deref(), Some("https://cdn/featured.jpg"));

        let payload = json!([{
            "id": "gid://shopify/Product/1",
            "images": [{ "url": "https://cdn/first.jpg" }],
            "featuredImage": { "originalSrc": "https://cdn/featured.jpg" }
        }]);
        let picked = normalize_picker_payload(payload).unwrap();
        assert_eq!(picked[0].image_url.as_deref(), Some("https://cdn/first.jpg"));
    }

    #[test]
    fn empty_image_urls_fall_through() {
        let payload = json!([{
            "id": "gid://shopify/Product/1",
            "images": [{ "src": "", "url": "" }],
            "featuredImage": { "originalSrc": "https://cdn/featured.jpg" }
        }]);
        let picked = normalize_picker_payload(payload).unwrap();
        assert_eq!(picked[0].image_url.as_deref(), Some("https://cdn/featured.jpg"));

        let payload = json!([{
            "id": "gid://shopify/Product/2",
            "featuredImage": { "originalSrc": "" },
            "image": { "src": "https://cdn/image.jpg" }
        }]);
        let picked = normalize_picker_payload(payload).unwrap();
        assert_eq!(picked[0].image_url.as_deref(), Some("https://cdn/image.jpg"));

        let payload = json!([{ "id": "gid://shopify/Product/3", "image": { "src": "" } }]);
        let picked = normalize_picker_payload(payload).unwrap();
        assert_eq!(picked[0].image_url, None);
    }

    #[test]
    fn bad_product_id_is_an_error() {
        let err = normalize_picker_payload(json!([{ "id": "gid://shopify/Product/x" }]));
        assert!(matches!(err, Err(ApiError::InvalidProductRef(_))));
    }
}
