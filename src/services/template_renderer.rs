//! Template renderer
//!
//! Materializes one output file per structure entry. Entries ending in `.tpl`
//! are rendered with Tera; everything else is copied byte-for-byte.
//!
//! Every render parses into a fresh `Tera` instance registered under the
//! combination's own name (`<language>-<version>`), so no template state is
//! shared between combinations.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tera::Tera;
use tracing::debug;

use crate::domain::{is_template, Combination, OutputTarget, RenderContext};
use crate::error::RenderError;

pub struct TemplateRenderer {
    template_root: PathBuf,
    output_root: PathBuf,
}

impl TemplateRenderer {
    pub fn new(template_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            template_root: template_root.into(),
            output_root: output_root.into(),
        }
    }

    /// Materialize one structure entry for a combination.
    ///
    /// Returns the path of the written file.
    pub fn render_entry(
        &self,
        combination: &Combination<'_>,
        entry: &str,
    ) -> Result<PathBuf, RenderError> {
        let target = OutputTarget::for_entry(combination, entry);
        let source = self.template_root.join(entry);
        let dst_dir = self.output_root.join(&target.dir);

        self.render_file(
            &source,
            &dst_dir,
            &target.file_name,
            &RenderContext::for_structure(combination),
            &combination.template_instance(),
        )
    }

    /// Render (or copy) `source` into `dst_dir/file_name`.
    ///
    /// The destination directory and any missing parents are created first;
    /// existing directories are fine. The destination is truncated on every run.
    pub fn render_file(
        &self,
        source: &Path,
        dst_dir: &Path,
        file_name: &str,
        context: &RenderContext,
        instance: &str,
    ) -> Result<PathBuf, RenderError> {
        std::fs::create_dir_all(dst_dir).map_err(|source| RenderError::CreateDir {
            path: dst_dir.to_path_buf(),
            source,
        })?;

        let destination = dst_dir.join(file_name);
        let read_err = |err| RenderError::Read {
            path: source.to_path_buf(),
            source: err,
        };

        if is_template(&source.to_string_lossy()) {
            let content = std::fs::read_to_string(source).map_err(read_err)?;
            let tera = parse(instance, &content)?;
            let mut out = create(&destination)?;
            execute(&tera, instance, context, &mut out)?;
            finish(out, &destination)?;
        } else {
            let bytes = std::fs::read(source).map_err(read_err)?;
            let mut out = create(&destination)?;
            out.write_all(&bytes).map_err(|source| RenderError::Write {
                path: destination.clone(),
                source,
            })?;
            finish(out, &destination)?;
        }

        debug!(
            source = %source.display(),
            destination = %destination.display(),
            "Materialized file"
        );
        Ok(destination)
    }
}

/// Render template text held in memory.
pub fn render_string(
    instance: &str,
    content: &str,
    context: &RenderContext,
) -> Result<String, RenderError> {
    let tera = parse(instance, content)?;
    let mut out = Vec::new();
    execute(&tera, instance, context, &mut out)?;
    // Tera only emits UTF-8 from UTF-8 templates and string values
    Ok(String::from_utf8_lossy(&out).into_owned())
}

fn parse(instance: &str, content: &str) -> Result<Tera, RenderError> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    tera.add_raw_template(instance, content)
        .map_err(|source| RenderError::Parse {
            template: instance.to_string(),
            source,
        })?;
    Ok(tera)
}

fn execute(
    tera: &Tera,
    instance: &str,
    context: &RenderContext,
    out: &mut impl Write,
) -> Result<(), RenderError> {
    let execute_err = |source| RenderError::Execute {
        template: instance.to_string(),
        source,
    };
    let ctx = tera::Context::from_serialize(context).map_err(execute_err)?;
    tera.render_to(instance, &ctx, out).map_err(execute_err)
}

fn create(path: &Path) -> Result<BufWriter<File>, RenderError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| RenderError::Write {
            path: path.to_path_buf(),
            source,
        })
}

fn finish(mut out: BufWriter<File>, path: &Path) -> Result<(), RenderError> {
    out.flush().map_err(|source| RenderError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LanguageSpec;
    use crate::domain::expand;

    fn python() -> LanguageSpec {
        LanguageSpec {
            name: "python".to_string(),
            versions: vec!["3.9".to_string(), "3.10".to_string()],
            structure: vec![],
        }
    }

    fn setup(files: &[(&str, &str)]) -> (tempfile::TempDir, TemplateRenderer) {
        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join("templates");
        std::fs::create_dir_all(&templates).unwrap();
        for (name, content) in files {
            let path = templates.join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        let renderer = TemplateRenderer::new(templates, dir.path().join("out"));
        (dir, renderer)
    }

    #[test]
    fn test_renders_nested_template() {
        let (dir, renderer) = setup(&[(
            "foo/bar.sh.tpl",
            "#!/bin/sh\necho {{ LangName }} {{ LangVersion }}\n",
        )]);
        let lang = python();
        let combos = expand(std::slice::from_ref(&lang));
        let combo = &combos[0];

        let written = renderer.render_entry(combo, "foo/bar.sh.tpl").unwrap();
        assert_eq!(written, dir.path().join("out/python/3.9/foo/bar.sh"));
        assert_eq!(
            std::fs::read_to_string(written).unwrap(),
            "#!/bin/sh\necho python 3.9\n"
        );
    }

    #[test]
    fn test_copies_static_file_verbatim() {
        let bytes: &[u8] = b"{{ LangName }} stays \xff\x00 raw";
        let (dir, renderer) = setup(&[]);
        std::fs::write(dir.path().join("templates/baz.txt"), bytes).unwrap();
        let lang = python();
        let combos = expand(std::slice::from_ref(&lang));
        let combo = &combos[1];

        renderer.render_entry(combo, "baz.txt").unwrap();
        let out = std::fs::read(dir.path().join("out/python/3.10/baz.txt")).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let (dir, renderer) = setup(&[("README.md.tpl", "# {{ LangName }} <{{ LangVersion }}>\n")]);
        let lang = python();
        let combos = expand(std::slice::from_ref(&lang));

        renderer.render_entry(&combos[0], "README.md.tpl").unwrap();
        let first = std::fs::read(dir.path().join("out/python/3.9/README.md")).unwrap();
        renderer.render_entry(&combos[0], "README.md.tpl").unwrap();
        let second = std::fs::read(dir.path().join("out/python/3.9/README.md")).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, b"# python <3.9>\n");
    }

    #[test]
    fn test_structure_context_has_empty_alpine_version() {
        let (dir, renderer) = setup(&[("a.tpl", "[{{ AlpineVersion }}]")]);
        let lang = python();
        let combos = expand(std::slice::from_ref(&lang));
        let combo = &combos[0];

        renderer.render_entry(combo, "a.tpl").unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("out/python/3.9/a")).unwrap(),
            "[]"
        );
    }

    #[test]
    fn test_missing_source_is_read_error() {
        let (_dir, renderer) = setup(&[]);
        let lang = python();
        let combos = expand(std::slice::from_ref(&lang));
        let combo = &combos[0];

        let err = renderer.render_entry(combo, "missing.tpl").unwrap_err();
        assert!(matches!(err, RenderError::Read { .. }));
    }

    #[test]
    fn test_bad_syntax_is_parse_error() {
        let (_dir, renderer) = setup(&[("bad.tpl", "{{ LangName ")]);
        let lang = python();
        let combos = expand(std::slice::from_ref(&lang));
        let combo = &combos[0];

        let err = renderer.render_entry(combo, "bad.tpl").unwrap_err();
        match err {
            RenderError::Parse { template, .. } => assert_eq!(template, "python-3.9"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_variable_is_execute_error() {
        let (_dir, renderer) = setup(&[("bad.tpl", "{{ Nope }}")]);
        let lang = python();
        let combos = expand(std::slice::from_ref(&lang));
        let combo = &combos[0];

        let err = renderer.render_entry(combo, "bad.tpl").unwrap_err();
        assert!(matches!(err, RenderError::Execute { .. }));
    }

    #[test]
    fn test_directory_blocked_by_file_is_create_dir_error() {
        let (dir, renderer) = setup(&[("x.txt", "x")]);
        std::fs::create_dir_all(dir.path().join("out")).unwrap();
        std::fs::write(dir.path().join("out/python"), b"not a dir").unwrap();
        let lang = python();
        let combos = expand(std::slice::from_ref(&lang));
        let combo = &combos[0];

        let err = renderer.render_entry(combo, "x.txt").unwrap_err();
        assert!(matches!(err, RenderError::CreateDir { .. }));
    }

    #[test]
    fn test_render_string_uses_full_context() {
        let lang = python();
        let combos = expand(std::slice::from_ref(&lang));
        let combo = &combos[0];
        let ctx = RenderContext::for_dockerfile(combo, "3.13");

        let out = render_string(
            &combo.dockerfile_instance(),
            "FROM {{ LangName }}:{{ LangVersion }}-alpine{{ AlpineVersion }}",
            &ctx,
        )
        .unwrap();
        assert_eq!(out, "FROM python:3.9-alpine3.13");
    }
}
