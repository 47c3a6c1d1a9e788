//! # Archivos Estáticos
//! src/commands/static_files.rs
//!
//! `GET /static/<ruta>` sirve `<root>/static/<ruta>` con el Content-Type
//! según la extensión. Cualquier problema (no existe, no se puede leer,
//! es un directorio, intenta salir del root con `..`) es un 404.

use crate::http::mime::content_type_for;
use crate::http::{Request, Response, StatusCode};
use crate::router::RequestContext;
use std::fs::File;
use std::path::{Component, Path, PathBuf};

/// Handler para /static/*
pub fn static_handler(req: &Request, ctx: &RequestContext<'_>) -> Response {
    let Some(full_path) = resolve(ctx.root, req.path()) else {
        tracing::debug!(path = req.path(), "Path rechazado");
        return Response::not_found();
    };

    let file = match File::open(&full_path) {
        Ok(file) => file,
        Err(e) => {
            tracing::debug!(path = %full_path.display(), error = %e, "Archivo no disponible");
            return Response::not_found();
        }
    };

    let len = match file.metadata() {
        Ok(meta) if meta.is_file() => meta.len(),
        Ok(_) => return Response::not_found(),
        Err(e) => {
            tracing::debug!(path = %full_path.display(), error = %e, "fstat falló");
            return Response::not_found();
        }
    };

    Response::new(StatusCode::Ok)
        .with_header("Content-Type", content_type_for(&full_path))
        .with_file(file, len)
}

/// Une `root` con el path del URL (sin el '/' inicial)
///
/// Retorna `None` si el path tiene componentes `..` o absolutos que
/// escaparían del root.
///
/// # Ejemplo
/// ```
/// use prefork_httpd::commands::static_files::resolve;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(
///     resolve(Path::new("/srv"), "/static/a.txt"),
///     Some(PathBuf::from("/srv/static/a.txt"))
/// );
/// assert_eq!(resolve(Path::new("/srv"), "/static/../etc/passwd"), None);
/// ```
pub fn resolve(root: &Path, url_path: &str) -> Option<PathBuf> {
    let relative = Path::new(url_path.trim_start_matches('/'));
    let mut full = root.to_path_buf();

    for component in relative.components() {
        match component {
            Component::Normal(part) => full.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(full)
}
