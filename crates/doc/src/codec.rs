use crate::config::DocConfig;
use crate::converter::{Converter, ConverterRegistry};
use crate::element::Element;
use crate::error::{DocError, Result};
use crate::graph::{MarshalContext, UnmarshalContext};
use crate::persist::Root;
use crate::reader::XmlReader;
use crate::writer::XmlWriter;
use std::path::Path;

/// Encodes and decodes whole documents.
///
/// A codec owns its configuration and converter registry; every call runs a
/// fresh pass with its own identity tables, so one codec can be shared across
/// threads.
#[derive(Debug, Clone, Default)]
pub struct DocumentCodec {
    config: DocConfig,
    registry: ConverterRegistry,
}

impl DocumentCodec {
    pub fn new(config: DocConfig) -> Result<Self> {
        config.validate().map_err(DocError::invalid_config)?;
        Ok(Self {
            config,
            registry: ConverterRegistry::new(),
        })
    }

    pub fn register_converter<C>(&mut self, converter: C)
    where
        C: Converter + 'static,
    {
        self.registry.register(converter);
    }

    pub fn config(&self) -> &DocConfig {
        &self.config
    }

    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    /// Encode `value` into an element tree rooted at `T::ELEMENT`.
    pub fn to_element<T: Root>(&self, value: &T) -> Result<Element> {
        let mut writer = XmlWriter::new(T::ELEMENT);
        let mut ctx = MarshalContext::new(&self.registry, &self.config);
        ctx.convert_another(value, &mut writer)?;
        log::trace!(
            "encoded <{}> with {} shared node(s)",
            T::ELEMENT,
            ctx.written_count()
        );
        writer.finish()
    }

    pub fn to_xml<T: Root>(&self, value: &T) -> Result<String> {
        Ok(self.to_element(value)?.render(&self.config))
    }

    /// Decode an element tree whose root must be named `T::ELEMENT`.
    pub fn from_element<T: Root>(&self, root: &Element) -> Result<T> {
        if root.name() != T::ELEMENT {
            return Err(DocError::UnexpectedRoot {
                expected: T::ELEMENT.to_string(),
                found: root.name().to_string(),
            });
        }
        let reader = XmlReader::new(root);
        let mut ctx = UnmarshalContext::new(&self.registry, &self.config).with_document(root);
        let value = ctx.convert_another(&reader)?;
        log::trace!(
            "decoded <{}> with {} shared node(s)",
            T::ELEMENT,
            ctx.materialized_count()
        );
        Ok(value)
    }

    /// Parse `input`, rejecting nesting deeper than the configured limit.
    pub fn parse(&self, input: &str) -> Result<Element> {
        Element::parse_with_limit(input, self.config.max_depth)
    }

    pub fn from_xml<T: Root>(&self, input: &str) -> Result<T> {
        let root = self.parse(input)?;
        self.from_element(&root)
    }

    pub fn write_to_path<T: Root>(&self, value: &T, path: impl AsRef<Path>) -> Result<()> {
        let xml = self.to_xml(value)?;
        std::fs::write(path.as_ref(), xml)?;
        log::debug!("wrote {}", path.as_ref().display());
        Ok(())
    }

    pub fn read_from_path<T: Root>(&self, path: impl AsRef<Path>) -> Result<T> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        self.from_xml(&raw)
    }
}
