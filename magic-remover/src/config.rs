use anyhow::{Context, Result, bail};
use background_remover::{Model, batch::DEFAULT_SUFFIX};
use log::debug;
use once_cell::sync::Lazy;
use platform_dirs::AppDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::Mutex};
use uuid::Uuid;

const CARGO_TOML: &str = include_str!("../Cargo.toml");
static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::default()));

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct Config {
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(skip)]
    pub data_dir: PathBuf,

    #[serde(skip)]
    pub is_first_run: bool,

    #[serde(skip)]
    pub app_name: String,

    #[serde(default = "appid_default")]
    pub appid: String,

    #[serde(default)]
    pub preference: Preference,

    #[serde(default)]
    pub editor: Editor,

    #[serde(default)]
    pub remover: Remover,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
pub struct Preference {
    #[derivative(Default(value = "1000"))]
    pub win_width: u32,

    #[derivative(Default(value = "750"))]
    pub win_height: u32,

    #[derivative(Default(value = "16"))]
    pub font_size: u32,

    #[derivative(Default(value = "\"en\".to_string()"))]
    pub language: String,

    pub is_dark: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
pub struct Editor {
    #[derivative(Default(value = "10"))]
    pub history_limit: u32,

    #[derivative(Default(value = "5.0"))]
    pub blur_radius: f32,

    #[derivative(Default(value = "\"PNG\".to_string()"))]
    pub output_format: String,

    #[derivative(Default(value = "DEFAULT_SUFFIX.to_string()"))]
    pub batch_suffix: String,

    // Directory of the last opened or saved file
    #[serde(default)]
    pub last_dir: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
pub struct Remover {
    #[derivative(Default(value = "Model::default().to_str().to_string()"))]
    pub model: String,

    // Empty means `<data_dir>/models`
    #[serde(default)]
    pub model_dir: String,
}

impl Config {
    pub fn init(&mut self) -> Result<()> {
        let metadata = toml::from_str::<toml::Table>(CARGO_TOML).expect("Parse Cargo.toml error");

        self.app_name = metadata
            .get("package")
            .and_then(|package| package.get("name"))
            .and_then(|name| name.as_str())
            .unwrap_or("magic-remover")
            .to_string();

        let app_dirs = AppDirs::new(Some(&self.app_name), true)
            .with_context(|| "no home directory found")?;
        self.crate_dirs(&app_dirs)?;
        self.load().with_context(|| "load config file failed")?;
        debug!("{:?}", self);
        Ok(())
    }

    fn crate_dirs(&mut self, app_dirs: &AppDirs) -> Result<()> {
        self.config_path = app_dirs.config_dir.join(format!("{}.toml", self.app_name));
        self.data_dir = app_dirs.data_dir.clone();

        if self.appid.is_empty() {
            self.appid = appid_default();
        }

        fs::create_dir_all(&app_dirs.data_dir)?;
        fs::create_dir_all(&app_dirs.config_dir)?;
        fs::create_dir_all(self.model_dir())?;

        Ok(())
    }

    fn load(&mut self) -> Result<()> {
        let loaded = fs::read_to_string(&self.config_path)
            .ok()
            .and_then(|text| toml::from_str::<Config>(&text).ok());

        match loaded {
            Some(mut c) => {
                c.config_path = self.config_path.clone();
                c.data_dir = self.data_dir.clone();
                c.is_first_run = self.is_first_run;
                c.app_name = self.app_name.clone();
                if c.appid.is_empty() {
                    c.appid = self.appid.clone();
                }
                *self = c;

                Ok(())
            }
            None => {
                self.is_first_run = true;

                if self.config_path.exists() {
                    let mut bak_file = self.config_path.as_os_str().to_os_string();
                    bak_file.push(".bak");
                    _ = fs::copy(&self.config_path, bak_file);
                    log::warn!("{} is corrupt, rewrite it with defaults", self.config_path.display());
                }

                match toml::to_string_pretty(self) {
                    Ok(text) => Ok(fs::write(&self.config_path, text)?),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        match toml::to_string_pretty(self) {
            Ok(text) => Ok(fs::write(&self.config_path, text)
                .with_context(|| "save config failed".to_string())?),
            Err(e) => bail!(format!("convert config from toml format failed. {e:?}")),
        }
    }

    pub fn model_dir(&self) -> PathBuf {
        if self.remover.model_dir.trim().is_empty() {
            self.data_dir.join("models")
        } else {
            PathBuf::from(self.remover.model_dir.trim())
        }
    }

    /// The configured model and where its file should live. Unknown names fall back to the default model.
    pub fn model(&self) -> (Model, PathBuf) {
        let model = Model::try_from(&self.remover.model).unwrap_or_default();
        (model, self.model_dir().join(model.to_str()))
    }
}

fn appid_default() -> String {
    Uuid::new_v4().to_string()
}

pub fn init() {
    CONFIG.lock().unwrap().init().unwrap();
}

pub fn all() -> Config {
    CONFIG.lock().unwrap().clone()
}

pub fn save(conf: Config) -> Result<()> {
    let mut config = CONFIG.lock().unwrap();
    *config = conf;
    config.save()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &std::path::Path) -> Config {
        Config {
            config_path: dir.join("magic-remover.toml"),
            data_dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.preference.win_width, 1000);
        assert_eq!(config.preference.win_height, 750);
        assert_eq!(config.editor.history_limit, 10);
        assert_eq!(config.editor.blur_radius, 5.0);
        assert_eq!(config.editor.output_format, "PNG");
        assert_eq!(config.editor.batch_suffix, "_nobg");
        assert_eq!(config.remover.model, "u2net.onnx");
    }

    #[test]
    fn test_first_run_writes_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut config = config_in(dir.path());

        config.load()?;

        assert!(config.is_first_run);
        let text = fs::read_to_string(&config.config_path)?;
        assert!(text.contains("history_limit = 10"));
        Ok(())
    }

    #[test]
    fn test_load_existing_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut config = config_in(dir.path());
        config.editor.blur_radius = 2.5;
        config.remover.model = "u2netp.onnx".to_string();
        config.save()?;

        let mut reloaded = config_in(dir.path());
        reloaded.load()?;

        assert!(!reloaded.is_first_run);
        assert_eq!(reloaded.editor.blur_radius, 2.5);
        assert_eq!(reloaded.model().0, Model::U2NetP);
        Ok(())
    }

    #[test]
    fn test_corrupt_file_is_backed_up() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut config = config_in(dir.path());
        fs::write(&config.config_path, "preference = [[[")?;

        config.load()?;

        assert!(config.is_first_run);
        let bak = dir.path().join("magic-remover.toml.bak");
        assert_eq!(fs::read_to_string(bak)?, "preference = [[[");
        assert!(toml::from_str::<Config>(&fs::read_to_string(&config.config_path)?).is_ok());
        Ok(())
    }

    #[test]
    fn test_model_dir_and_unknown_model() {
        let dir = PathBuf::from("/data");
        let mut config = Config {
            data_dir: dir.clone(),
            ..Default::default()
        };
        assert_eq!(config.model_dir(), dir.join("models"));

        config.remover.model = "missing.onnx".to_string();
        config.remover.model_dir = "/opt/models".to_string();
        let (model, path) = config.model();
        assert_eq!(model, Model::U2Net);
        assert_eq!(path, PathBuf::from("/opt/models/u2net.onnx"));
    }
}
