//! Typeface fonts for text shapes.
//!
//! Fonts are three.js-style "typeface" JSON documents: a map of glyphs,
//! each with an advance (`ha`) and an outline string of drawing commands
//! in font units, plus a `resolution` (units per em) and a bounding box
//! used for line height.
//!
//! # Outline commands
//!
//! | Command | Arguments | Meaning |
//! |---------|-----------|---------|
//! | `m` | `x y` | move to |
//! | `l` | `x y` | line to |
//! | `q` | `x y cx cy` | quadratic curve to `(x, y)` with control `(cx, cy)` |
//! | `b` | `x y c1x c1y c2x c2y` | cubic curve to `(x, y)` |
//! | `z` | | close contour |
//!
//! Note the end point comes *before* the control points.
//!
//! Loading goes through a [`FontFetcher`] so hosts can serve fonts from
//! disk, memory, or the network. [`FontLibrary`] caches parsed fonts by URL.

use crate::error::FontError;
use kurbo::BezPath;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// A parsed glyph.
#[derive(Debug, Clone)]
pub struct Glyph {
    /// Horizontal advance in font units.
    pub advance: f32,
    /// Outline in font units, y up. Empty for whitespace.
    pub outline: BezPath,
}

/// A parsed typeface font.
#[derive(Debug, Clone)]
pub struct TypefaceFont {
    family: String,
    resolution: f32,
    line_height: f32,
    glyphs: HashMap<char, Glyph>,
}

#[derive(Deserialize)]
struct TypefaceFile {
    glyphs: HashMap<String, GlyphRecord>,
    #[serde(default = "default_resolution")]
    resolution: f32,
    #[serde(rename = "boundingBox", default)]
    bounding_box: Option<BoundingBoxRecord>,
    #[serde(rename = "underlineThickness", default)]
    underline_thickness: f32,
    #[serde(rename = "familyName", default)]
    family_name: String,
}

#[derive(Deserialize)]
struct GlyphRecord {
    #[serde(default)]
    ha: f32,
    #[serde(default)]
    o: Option<String>,
}

#[derive(Deserialize)]
struct BoundingBoxRecord {
    #[serde(rename = "yMin")]
    y_min: f32,
    #[serde(rename = "yMax")]
    y_max: f32,
}

fn default_resolution() -> f32 {
    1000.0
}

impl TypefaceFont {
    /// Parse a typeface JSON document.
    ///
    /// Glyphs with malformed outlines are dropped with a warning; a font
    /// left with no glyphs at all is an error.
    pub fn from_json(bytes: &[u8]) -> Result<Self, FontError> {
        let file: TypefaceFile = serde_json::from_slice(bytes)?;

        let mut glyphs = HashMap::with_capacity(file.glyphs.len());
        for (key, record) in file.glyphs {
            let mut chars = key.chars();
            let (Some(ch), None) = (chars.next(), chars.next()) else {
                debug!(key = %key, "skipping multi-character glyph key");
                continue;
            };
            let outline = match record.o.as_deref() {
                Some(src) => match parse_outline(src) {
                    Some(path) => path,
                    None => {
                        warn!(glyph = %ch, "dropping glyph with malformed outline");
                        continue;
                    }
                },
                None => BezPath::new(),
            };
            glyphs.insert(
                ch,
                Glyph {
                    advance: record.ha,
                    outline,
                },
            );
        }

        if glyphs.is_empty() {
            return Err(FontError::NoGlyphs);
        }

        let resolution = if file.resolution > 0.0 {
            file.resolution
        } else {
            default_resolution()
        };
        let line_height = match file.bounding_box {
            Some(bb) => bb.y_max - bb.y_min + file.underline_thickness,
            None => resolution,
        };

        Ok(Self {
            family: file.family_name,
            resolution,
            line_height,
            glyphs,
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// Font units per em.
    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    /// Line advance in font units.
    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Glyph for `ch`, falling back to `?` when the font lacks it.
    pub fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch).or_else(|| self.glyphs.get(&'?'))
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }
}

/// Parse a typeface outline string into a path. `None` on malformed input.
pub fn parse_outline(src: &str) -> Option<BezPath> {
    let mut path = BezPath::new();
    let mut tokens = src.split_whitespace();
    let mut open = false;

    fn num<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Option<f64> {
        tokens.next()?.parse().ok()
    }

    while let Some(cmd) = tokens.next() {
        match cmd {
            "m" => {
                let (x, y) = (num(&mut tokens)?, num(&mut tokens)?);
                path.move_to((x, y));
                open = true;
            }
            "l" => {
                let (x, y) = (num(&mut tokens)?, num(&mut tokens)?);
                if !open {
                    return None;
                }
                path.line_to((x, y));
            }
            "q" => {
                let (x, y) = (num(&mut tokens)?, num(&mut tokens)?);
                let (cx, cy) = (num(&mut tokens)?, num(&mut tokens)?);
                if !open {
                    return None;
                }
                path.quad_to((cx, cy), (x, y));
            }
            "b" => {
                let (x, y) = (num(&mut tokens)?, num(&mut tokens)?);
                let (c1x, c1y) = (num(&mut tokens)?, num(&mut tokens)?);
                let (c2x, c2y) = (num(&mut tokens)?, num(&mut tokens)?);
                if !open {
                    return None;
                }
                path.curve_to((c1x, c1y), (c2x, c2y), (x, y));
            }
            "z" => {
                if open {
                    path.close_path();
                    open = false;
                }
            }
            _ => return None,
        }
    }

    Some(path)
}

/// Source of raw font bytes.
///
/// Implement this to load fonts from somewhere other than the local file
/// system (an HTTP client, an asset bundle). Called from worker threads.
pub trait FontFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FontError>;
}

/// Reads fonts from the local file system.
///
/// Accepts plain paths and `file://` URLs. Paths starting with `/` are
/// resolved against `root` when one is set, matching web-root style URLs
/// such as `/fonts/helvetiker_regular.typeface.json`.
#[derive(Debug, Clone, Default)]
pub struct FsFetcher {
    root: Option<PathBuf>,
}

impl FsFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, url: &str) -> Result<PathBuf, FontError> {
        let path = if let Some(rest) = url.strip_prefix("file://") {
            rest
        } else if url.contains("://") {
            return Err(FontError::UnsupportedScheme(url.to_string()));
        } else {
            url
        };
        Ok(match &self.root {
            Some(root) => root.join(path.trim_start_matches('/')),
            None => PathBuf::from(path),
        })
    }
}

impl FontFetcher for FsFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FontError> {
        let path = self.resolve(url)?;
        std::fs::read(&path).map_err(|source| FontError::Io {
            url: url.to_string(),
            source,
        })
    }
}

/// Serves fonts from memory, e.g. bytes embedded with `include_bytes!`.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    fonts: HashMap<String, Arc<Vec<u8>>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` under `url`.
    pub fn with(mut self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.fonts.insert(url.into(), Arc::new(bytes.into()));
        self
    }
}

impl FontFetcher for MemoryFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FontError> {
        self.fonts
            .get(url)
            .map(|b| b.as_ref().clone())
            .ok_or_else(|| FontError::Io {
                url: url.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such in-memory font"),
            })
    }
}

/// Fetches and caches parsed fonts. Cheap to clone; clones share the cache.
///
/// Failures are cached too: once a URL fails, later loads return
/// [`FontError::Unavailable`] without fetching again until
/// [`clear_failures`](Self::clear_failures) is called.
#[derive(Clone)]
pub struct FontLibrary {
    fetcher: Arc<dyn FontFetcher>,
    cache: Arc<Mutex<HashMap<String, Cached>>>,
}

#[derive(Clone)]
enum Cached {
    Loaded(Arc<TypefaceFont>),
    Failed(String),
}

impl FontLibrary {
    pub fn new(fetcher: Arc<dyn FontFetcher>) -> Self {
        Self {
            fetcher,
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Load `url`, using the cache when possible.
    ///
    /// The cache lock is not held while fetching, so two threads racing on
    /// the same URL may both fetch it; the second insert wins.
    pub fn load(&self, url: &str) -> Result<Arc<TypefaceFont>, FontError> {
        let hit = self.lock().get(url).cloned();
        match hit {
            Some(Cached::Loaded(font)) => return Ok(font),
            Some(Cached::Failed(reason)) => {
                return Err(FontError::Unavailable {
                    url: url.to_string(),
                    reason,
                })
            }
            None => {}
        }

        let loaded = self
            .fetcher
            .fetch(url)
            .and_then(|bytes| TypefaceFont::from_json(&bytes));
        match loaded {
            Ok(font) => {
                let font = Arc::new(font);
                debug!(url, family = font.family(), glyphs = font.glyph_count(), "loaded typeface font");
                self.lock().insert(url.to_string(), Cached::Loaded(Arc::clone(&font)));
                Ok(font)
            }
            Err(err) => {
                warn!(url, error = %err, "font load failed; not retrying");
                self.lock().insert(url.to_string(), Cached::Failed(err.to_string()));
                Err(err)
            }
        }
    }

    pub fn cached(&self, url: &str) -> Option<Arc<TypefaceFont>> {
        match self.lock().get(url) {
            Some(Cached::Loaded(font)) => Some(Arc::clone(font)),
            _ => None,
        }
    }

    /// Forget remembered failures so the next load fetches again.
    pub fn clear_failures(&self) {
        self.lock().retain(|_, c| matches!(c, Cached::Loaded(_)));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Cached>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FontLibrary {
    fn default() -> Self {
        Self::new(Arc::new(FsFetcher::new()))
    }
}

impl std::fmt::Debug for FontLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached = self
            .cache
            .lock()
            .map(|c| c.len())
            .unwrap_or_default();
        f.debug_struct("FontLibrary").field("cached", &cached).finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use kurbo::PathEl;

    /// A two-glyph font: a triangle `A` and a square `?`, plus a space.
    pub(crate) const TINY_FONT: &str = r#"{
        "familyName": "Tiny",
        "resolution": 1000,
        "underlineThickness": 50,
        "boundingBox": { "xMin": 0, "xMax": 1000, "yMin": -200, "yMax": 1000 },
        "glyphs": {
            "A": { "ha": 1000, "o": "m 0 0 l 500 1000 l 1000 0 z" },
            "?": { "ha": 800, "o": "m 0 0 l 0 700 l 700 700 l 700 0 z" },
            " ": { "ha": 300 }
        }
    }"#;

    #[test]
    fn test_parse_font() {
        let font = TypefaceFont::from_json(TINY_FONT.as_bytes()).unwrap();
        assert_eq!(font.family(), "Tiny");
        assert_eq!(font.glyph_count(), 3);
        assert_eq!(font.line_height(), 1250.0);
        assert_eq!(font.glyph('A').unwrap().advance, 1000.0);
        // Unknown glyphs fall back to '?'
        assert_eq!(font.glyph('Z').unwrap().advance, 800.0);
        assert!(font.glyph(' ').unwrap().outline.elements().is_empty());
    }

    #[test]
    fn test_outline_argument_order() {
        let path = parse_outline("m 0 0 q 10 0 5 5 b 0 10 1 2 3 4 z").unwrap();
        let els = path.elements();
        assert_eq!(els[1], PathEl::QuadTo((5.0, 5.0).into(), (10.0, 0.0).into()));
        assert_eq!(
            els[2],
            PathEl::CurveTo((1.0, 2.0).into(), (3.0, 4.0).into(), (0.0, 10.0).into())
        );
        assert_eq!(els[3], PathEl::ClosePath);
    }

    #[test]
    fn test_malformed_outline() {
        assert!(parse_outline("m 0").is_none());
        assert!(parse_outline("l 1 1").is_none());
        assert!(parse_outline("m 0 0 x 1 1").is_none());
    }

    #[test]
    fn test_empty_font_is_error() {
        let err = TypefaceFont::from_json(br#"{"glyphs": {}}"#).unwrap_err();
        assert!(matches!(err, FontError::NoGlyphs));
    }

    #[test]
    fn test_fs_fetcher_rejects_remote_schemes() {
        let err = FsFetcher::new().fetch("https://example.com/font.json").unwrap_err();
        assert!(matches!(err, FontError::UnsupportedScheme(_)));
    }

    #[test]
    fn test_fs_fetcher_root_resolution() {
        let fetcher = FsFetcher::with_root("/srv/site");
        assert_eq!(
            fetcher.resolve("/fonts/a.json").unwrap(),
            PathBuf::from("/srv/site/fonts/a.json")
        );
        assert_eq!(
            fetcher.resolve("file://fonts/a.json").unwrap(),
            PathBuf::from("/srv/site/fonts/a.json")
        );
    }

    #[test]
    fn test_library_caches() {
        let fetcher = MemoryFetcher::new().with("tiny", TINY_FONT);
        let lib = FontLibrary::new(Arc::new(fetcher));
        assert!(lib.cached("tiny").is_none());
        let a = lib.load("tiny").unwrap();
        let b = lib.load("tiny").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(matches!(lib.load("missing"), Err(FontError::Io { .. })));
    }

    struct CountingFetcher {
        inner: MemoryFetcher,
        calls: std::sync::atomic::AtomicUsize,
    }

    impl FontFetcher for CountingFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, FontError> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.inner.fetch(url)
        }
    }

    #[test]
    fn test_library_remembers_failures() {
        let fetcher = Arc::new(CountingFetcher {
            inner: MemoryFetcher::new().with("tiny", TINY_FONT),
            calls: Default::default(),
        });
        let lib = FontLibrary::new(fetcher.clone());
        let calls = || fetcher.calls.load(std::sync::atomic::Ordering::SeqCst);

        assert!(matches!(lib.load("missing"), Err(FontError::Io { .. })));
        assert!(matches!(lib.load("missing"), Err(FontError::Unavailable { .. })));
        assert!(matches!(lib.load("missing"), Err(FontError::Unavailable { .. })));
        assert_eq!(calls(), 1);
        assert!(lib.cached("missing").is_none());

        lib.load("tiny").unwrap();
        lib.clear_failures();
        assert!(lib.cached("tiny").is_some());
        assert!(matches!(lib.load("missing"), Err(FontError::Io { .. })));
        assert_eq!(calls(), 3);
    }
}
