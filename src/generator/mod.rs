mod contracts;
mod interfaces;
mod names;
mod types;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use crate::document;
use crate::error::Result;
use crate::settings::GenerationConfig;

use interfaces::{InterfaceWriter, collect_operations, group_operations};

pub(crate) const GENERATED_CODE_ATTRIBUTE: &str = concat!(
    "[System.CodeDom.Compiler.GeneratedCode(\"oas2cs\", \"",
    env!("CARGO_PKG_VERSION"),
    "\")]"
);

const DEFAULT_USINGS: [&str; 6] = [
    "Refit",
    "System",
    "System.Collections.Generic",
    "System.Text.Json.Serialization",
    "System.Threading",
    "System.Threading.Tasks",
];

/// Builds a generator for a resolved configuration.
#[async_trait]
pub trait GeneratorFactory: Send + Sync {
    async fn create(&self, config: &GenerationConfig) -> Result<Box<dyn ClientGenerator>>;
}

/// Produces the source text of a generated client.
pub trait ClientGenerator: Send {
    fn generate(&self) -> Result<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RefitGeneratorFactory;

#[async_trait]
impl GeneratorFactory for RefitGeneratorFactory {
    async fn create(&self, config: &GenerationConfig) -> Result<Box<dyn ClientGenerator>> {
        Ok(Box::new(RefitGenerator::create(config.clone()).await?))
    }
}

/// Generates a C# Refit client: one or more interfaces plus optional contract types.
pub struct RefitGenerator {
    openapi: Value,
    config: GenerationConfig,
    path_filters: Vec<Regex>,
}

impl RefitGenerator {
    /// Loads the document the configuration points at.
    pub async fn create(config: GenerationConfig) -> Result<Self> {
        let openapi = document::load(&config.open_api_path).await?;
        Self::new(openapi, config)
    }

    /// Creates a generator for an already parsed document.
    ///
    /// # Arguments
    ///
    /// * `openapi` - The OpenAPI document as a serde_json `Value`.
    /// * `config` - The resolved generation settings.
    ///
    /// # Returns
    ///
    /// * `Result<Self>` - Fails if an `--match-paths` entry is not a valid regular expression.
    pub fn new(openapi: Value, config: GenerationConfig) -> Result<Self> {
        let path_filters = config
            .include_path_matches
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            openapi,
            config,
            path_filters,
        })
    }

    /// Appends the optional `<auto-generated>` banner.
    ///
    /// The banner carries the tool version but no timestamp, so regenerating
    /// from the same document yields the same file.
    ///
    /// # Arguments
    ///
    /// * `code` - A mutable reference to the string where the generated C# code will be appended.
    fn add_header(&self, code: &mut String) {
        if !self.config.add_auto_generated_header {
            return;
        }
        code.push_str("// <auto-generated>\n");
        code.push_str(&format!(
            "//     This code was generated by oas2cs v{}\n",
            env!("CARGO_PKG_VERSION")
        ));
        code.push_str("//\n");
        code.push_str("//     Changes to this file may cause incorrect behavior and will be lost if\n");
        code.push_str("//     the code is regenerated.\n");
        code.push_str("// </auto-generated>\n\n");
    }

    /// Appends `using` directives, default namespaces first, without duplicates.
    fn add_usings(&self, code: &mut String) {
        let mut namespaces: Vec<&str> = DEFAULT_USINGS.to_vec();
        if self.config.generate_contracts {
            namespaces.push("System.Runtime.Serialization");
        }
        for namespace in &self.config.additional_namespaces {
            if !namespaces.contains(&namespace.as_str()) {
                namespaces.push(namespace);
            }
        }
        for namespace in namespaces {
            code.push_str(&format!("using {namespace};\n"));
        }
        code.push_str("\n#nullable enable annotations\n\n");
    }
}

impl ClientGenerator for RefitGenerator {
    /// Generates the complete C# source file.
    ///
    /// Emits the header, the `using` directives, and the namespace. Inside the
    /// namespace come the interfaces for every operation that passes the path,
    /// tag, and deprecation filters, followed by contract types when
    /// contracts are enabled.
    ///
    /// # Returns
    ///
    /// * `Result<String>` - The generated source with `\n` line endings.
    fn generate(&self) -> Result<String> {
        let mut code = String::new();

        self.add_header(&mut code);
        self.add_usings(&mut code);
        code.push_str(&format!("namespace {}\n{{\n", self.config.namespace));

        let operations = collect_operations(&self.openapi, &self.config, &self.path_filters);
        tracing::debug!(operations = operations.len(), "generating interfaces");
        let writer = InterfaceWriter::new(&self.openapi, &self.config);
        let groups = group_operations(&self.openapi, operations, self.config.multiple_interfaces);
        for (index, (name, operations)) in groups.iter().enumerate() {
            if index > 0 {
                code.push('\n');
            }
            writer.write(&mut code, name, operations);
        }

        if self.config.generate_contracts {
            contracts::write_contracts(&mut code, &self.openapi, &self.config);
        }

        code.push_str("}\n");
        Ok(code)
    }
}
