//! 설정 파일 관리.
//!
//! API 자격증명, 릴레이 주소, 샘플링 간격을 `config.json` 하나에 담는다.
//! 첫 실행이면 기본값으로 파일을 만들고, 변경은 임시 파일에 쓴 뒤 교체한다.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::CoreError;

const CONFIG_FILE_NAME: &str = "config.json";
const APP_DIR_NAME: &str = "frameprompt";

/// `config.json` 관리자
///
/// 복제해도 같은 설정을 공유한다.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    current: Arc<RwLock<AppConfig>>,
    path: PathBuf,
}

impl ConfigManager {
    /// 플랫폼 기본 위치의 `config.json` 사용
    pub fn new() -> Result<Self, CoreError> {
        Self::with_path(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// 주어진 경로의 설정 파일 사용 (없으면 기본값으로 생성)
    pub fn with_path(path: PathBuf) -> Result<Self, CoreError> {
        let config = load_or_init(&path)?;
        Ok(Self {
            current: Arc::new(RwLock::new(config)),
            path,
        })
    }

    pub fn get(&self) -> AppConfig {
        self.current.read().clone()
    }

    /// 설정 교체. 파일 저장에 실패하면 메모리 값도 그대로 둔다.
    pub fn update(&self, config: AppConfig) -> Result<(), CoreError> {
        write_atomic(&self.path, &config)?;
        *self.current.write() = config;
        debug!(path = %self.path.display(), "설정 저장");
        Ok(())
    }

    /// 현재 설정을 고쳐 저장하고 저장된 값을 돌려준다
    pub fn update_with<F>(&self, edit: F) -> Result<AppConfig, CoreError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut next = self.get();
        edit(&mut next);
        self.update(next.clone())?;
        Ok(next)
    }

    pub fn config_path(&self) -> &Path {
        &self.path
    }

    /// 외부에서 수정된 파일 다시 읽기
    pub fn reload(&self) -> Result<(), CoreError> {
        let config = read_config(&self.path)?;
        *self.current.write() = config;
        info!(path = %self.path.display(), "설정 다시 로드");
        Ok(())
    }

    /// 플랫폼별 설정 디렉토리
    ///
    /// - macOS: `~/Library/Application Support/frameprompt`
    /// - Windows: `%APPDATA%\frameprompt`
    /// - Linux: `$XDG_CONFIG_HOME/frameprompt`, 없으면 `~/.config/frameprompt`
    pub fn config_dir() -> Result<PathBuf, CoreError> {
        resolve_config_dir(|key| std::env::var(key).ok())
    }
}

/// 환경 변수 조회 함수로 설정 디렉토리 결정
fn resolve_config_dir<F>(env: F) -> Result<PathBuf, CoreError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| {
        env(key)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| CoreError::Config(format!("{key} 환경 변수를 찾을 수 없습니다")))
    };

    if cfg!(target_os = "macos") {
        Ok(var("HOME")?
            .join("Library")
            .join("Application Support")
            .join(APP_DIR_NAME))
    } else if cfg!(target_os = "windows") {
        Ok(var("APPDATA")?.join(APP_DIR_NAME))
    } else if cfg!(target_os = "linux") {
        match var("XDG_CONFIG_HOME") {
            Ok(xdg) => Ok(xdg.join(APP_DIR_NAME)),
            Err(_) => Ok(var("HOME")?.join(".config").join(APP_DIR_NAME)),
        }
    } else {
        warn!("지원되지 않는 플랫폼, 현재 디렉토리 사용");
        Ok(PathBuf::from(".").join(APP_DIR_NAME))
    }
}

fn load_or_init(path: &Path) -> Result<AppConfig, CoreError> {
    if path.exists() {
        return read_config(path);
    }

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| io_failure("설정 디렉토리 생성", dir, e))?;
            info!(dir = %dir.display(), "설정 디렉토리 생성");
        }
    }

    let config = AppConfig::default_config();
    write_atomic(path, &config)?;
    info!(path = %path.display(), "기본 설정 파일 생성");
    Ok(config)
}

fn read_config(path: &Path) -> Result<AppConfig, CoreError> {
    let raw = fs::read_to_string(path).map_err(|e| io_failure("설정 파일 읽기", path, e))?;
    let config = serde_json::from_str(&raw).map_err(|e| {
        CoreError::Config(format!("설정 파일 파싱 실패: {}: {e}", path.display()))
    })?;
    debug!(path = %path.display(), "설정 파일 로드");
    Ok(config)
}

/// `<path>.tmp`에 쓴 뒤 rename으로 교체
fn write_atomic(path: &Path, config: &AppConfig) -> Result<(), CoreError> {
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| CoreError::Config(format!("설정 직렬화 실패: {e}")))?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, json).map_err(|e| io_failure("설정 파일 저장", &tmp, e))?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_failure("설정 파일 교체", path, e));
    }
    Ok(())
}

fn io_failure(action: &str, path: &Path, err: std::io::Error) -> CoreError {
    CoreError::Config(format!("{action} 실패: {}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn create_writes_default_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        let manager = ConfigManager::with_path(config_path.clone()).unwrap();
        assert!(config_path.exists());

        let config = manager.get();
        assert_eq!(config.relay.port, 3001);
        assert!(config.api.description_api_key.is_empty());
    }

    #[test]
    fn update_and_persist_api_fields() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let manager = ConfigManager::with_path(config_path.clone()).unwrap();
        manager
            .update_with(|c| {
                c.api.description_api_key = "key-1".to_string();
                c.api.description_model_id = "vision-1".to_string();
                c.sampling.interval_secs = 5;
            })
            .unwrap();

        let reopened = ConfigManager::with_path(config_path).unwrap();
        let config = reopened.get();
        assert_eq!(config.api.description_api_key, "key-1");
        assert_eq!(config.sampling.interval_secs, 5);
        assert!(config.api.description_credentials().is_some());
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let manager = ConfigManager::with_path(config_path).unwrap();

        manager.update_with(|c| c.relay.port = 5050).unwrap();

        let names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["config.json".to_string()]);
    }

    #[test]
    fn failed_save_keeps_previous_value() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let manager = ConfigManager::with_path(config_path.clone()).unwrap();

        fs::remove_file(&config_path).unwrap();
        fs::create_dir(&config_path).unwrap();

        let err = manager.update_with(|c| c.relay.port = 9999).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
        assert_eq!(manager.get().relay.port, 3001);
    }

    #[test]
    fn reload_picks_up_external_edit() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let manager = ConfigManager::with_path(config_path.clone()).unwrap();

        let mut config = manager.get();
        config.relay.port = 4040;
        fs::write(&config_path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        manager.reload().unwrap();
        assert_eq!(manager.get().relay.port, 4040);
    }

    #[test]
    fn corrupt_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        fs::write(&config_path, "{ not json").unwrap();

        let err = ConfigManager::with_path(config_path).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_config_dir_prefers_xdg() {
        use std::collections::HashMap;

        let env: HashMap<&str, &str> =
            HashMap::from([("HOME", "/home/u"), ("XDG_CONFIG_HOME", "/xdg")]);
        let dir = resolve_config_dir(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(dir, PathBuf::from("/xdg/frameprompt"));

        let env: HashMap<&str, &str> =
            HashMap::from([("HOME", "/home/u"), ("XDG_CONFIG_HOME", "")]);
        let dir = resolve_config_dir(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(dir, PathBuf::from("/home/u/.config/frameprompt"));

        let err = resolve_config_dir(|_| None).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }
}
