//! Types whose wire form is a plain string.

use super::unexpected;
use crate::{Element, Error, Primitive, Result, TypeProcessor};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Converts paths, URLs and boxed or shared strings.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextProcessor;

fn read_text<'e>(element: &'e Element, type_name: &str) -> Result<Option<&'e str>> {
    match element {
        Element::Primitive(Primitive::Null) => Ok(None),
        Element::Primitive(Primitive::String(text)) => Ok(Some(text.as_str())),
        other => Err(unexpected(type_name, "string", other)),
    }
}

impl TypeProcessor<PathBuf> for TextProcessor {
    fn to_element(&self, value: Option<&PathBuf>) -> Result<Element> {
        match value {
            None => Ok(Element::null()),
            Some(path) => path
                .to_str()
                .map(Element::from)
                .ok_or_else(|| Error::conversion("PathBuf", "UTF-8 path", path.display().to_string())),
        }
    }

    fn to_object(&self, element: &Element) -> Result<Option<PathBuf>> {
        Ok(read_text(element, "PathBuf")?.map(PathBuf::from))
    }
}

impl TypeProcessor<Url> for TextProcessor {
    fn to_element(&self, value: Option<&Url>) -> Result<Element> {
        Ok(value.map_or_else(Element::null, |url| Element::from(url.as_str())))
    }

    fn to_object(&self, element: &Element) -> Result<Option<Url>> {
        read_text(element, "Url")?
            .map(|text| {
                Url::parse(text).map_err(|e| Error::conversion("Url", format!("URL ({})", e), format!("{:?}", text)))
            })
            .transpose()
    }
}

impl TypeProcessor<Box<str>> for TextProcessor {
    fn to_element(&self, value: Option<&Box<str>>) -> Result<Element> {
        Ok(value.map_or_else(Element::null, |text| Element::from(&**text)))
    }

    fn to_object(&self, element: &Element) -> Result<Option<Box<str>>> {
        Ok(read_text(element, "Box<str>")?.map(Box::from))
    }
}

impl TypeProcessor<Arc<str>> for TextProcessor {
    fn to_element(&self, value: Option<&Arc<str>>) -> Result<Element> {
        Ok(value.map_or_else(Element::null, |text| Element::from(&**text)))
    }

    fn to_object(&self, element: &Element) -> Result<Option<Arc<str>>> {
        Ok(read_text(element, "Arc<str>")?.map(Arc::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url() {
        let url = Url::parse("https://example.com/a?b=c").unwrap();
        let element = TextProcessor.to_element(Some(&url)).unwrap();
        assert_eq!(element, Element::from("https://example.com/a?b=c"));
        assert_eq!(TextProcessor.to_object(&element).unwrap(), Some(url));

        let err = TypeProcessor::<Url>::to_object(&TextProcessor, &Element::from("not a url")).unwrap_err();
        assert!(matches!(err, Error::TypeConversion { .. }));
    }

    #[test]
    fn test_path_and_shared_strings() {
        let path = PathBuf::from("/var/lib/data.bin");
        let element = TextProcessor.to_element(Some(&path)).unwrap();
        assert_eq!(TextProcessor.to_object(&element).unwrap(), Some(path));

        let shared: Arc<str> = Arc::from("shared");
        let element = TextProcessor.to_element(Some(&shared)).unwrap();
        assert_eq!(TextProcessor.to_object(&element).unwrap(), Some(shared));

        assert!(TypeProcessor::<Box<str>>::to_object(&TextProcessor, &Element::from(3)).is_err());
        assert_eq!(
            TypeProcessor::<Box<str>>::to_object(&TextProcessor, &Element::null()).unwrap(),
            None
        );
    }
}
