//! Source map for the assembled stylesheet.

use crate::assemble::Mapping;
use crate::error::Result;
use sourcemap::SourceMapBuilder;
use std::path::Path;

/// Name of the stylesheet generated from `filename`: same path, `css` extension.
pub fn stylesheet_file_name(filename: &str) -> String {
    Path::new(filename)
        .with_extension("css")
        .to_string_lossy()
        .into_owned()
}

/// Serializes `mappings` as a v3 source map pointing into `filename`.
///
/// `source` is embedded as the file's `sourcesContent`. An empty mapping list yields an empty
/// string. Mappings without an original location are left out of the map. The output only
/// depends on the arguments, so repeated calls give identical text.
pub fn build_source_map(mappings: &[Mapping], filename: &str, source: &str) -> Result<String> {
    if mappings.is_empty() {
        return Ok(String::new());
    }

    let file = stylesheet_file_name(filename);
    let mut builder = SourceMapBuilder::new(Some(&file));
    let source_id = builder.add_source(filename);
    builder.set_source_contents(source_id, Some(source));

    for mapping in mappings {
        // Locations are 1-based lines; a missing or zero line has nowhere to point.
        let Some(original) = mapping.original.filter(|loc| loc.line > 0) else {
            log::debug!("no source location for {}, skipping its mapping", mapping.name);
            continue;
        };
        let name_id = builder.add_name(&mapping.name);
        builder.add_raw(
            mapping.generated.line.saturating_sub(1),
            mapping.generated.column,
            original.line - 1,
            original.column,
            Some(source_id),
            Some(name_id),
            false,
        );
    }

    let mut buf = Vec::new();
    builder.into_sourcemap().to_writer(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
