//! Software modules and the archives they are built from.

use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde::{Serialize, Serializer};
use url::Url;

use crate::core::target::{Target, TargetOs};
use crate::util::errors::ConfigurationError;

/// Qt version used when nothing else is configured.
pub const DEFAULT_QT_VERSION: Version = Version::new(6, 6, 3);

/// Version of the Qt installation the modules are built against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QtVersion(Version);

impl QtVersion {
    /// Version without separators, as used in the patched branch names
    /// (`6.6.3` → `663`).
    pub fn compact(&self) -> String {
        format!("{}{}{}", self.0.major, self.0.minor, self.0.patch)
    }
}

impl Default for QtVersion {
    fn default() -> Self {
        QtVersion(DEFAULT_QT_VERSION)
    }
}

impl FromStr for QtVersion {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let version = Version::parse(s.trim()).map_err(|e| ConfigurationError::InvalidQtVersion {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        if !version.pre.is_empty() || !version.build.is_empty() {
            return Err(ConfigurationError::InvalidQtVersion {
                value: s.to_string(),
                reason: "expected a plain MAJOR.MINOR.PATCH release".to_string(),
            });
        }
        Ok(QtVersion(version))
    }
}

impl fmt::Display for QtVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for QtVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A downloadable archive and the directory it unpacks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceArchive {
    pub url: Url,
    /// File name under the download directory
    pub file_name: String,
    /// Top-level directory inside the archive
    pub dir_name: String,
}

/// A Qt module this tool knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Software {
    QtMqtt,
    /// Patched fork carrying BLE scan filtering, only needed on android
    QtConnectivity,
}

impl Software {
    pub const ALL: [Software; 2] = [Software::QtMqtt, Software::QtConnectivity];

    pub fn name(&self) -> &'static str {
        match self {
            Software::QtMqtt => "qtmqtt",
            Software::QtConnectivity => "qtconnectivity",
        }
    }

    /// Display name used in status output.
    pub fn pretty_name(&self) -> &'static str {
        match self {
            Software::QtMqtt => "QtMqtt",
            Software::QtConnectivity => "QtConnectivity",
        }
    }

    /// Whether this module gets built for the given target.
    pub fn applies_to(&self, target: &Target) -> bool {
        match self {
            Software::QtMqtt => true,
            Software::QtConnectivity => target.os == TargetOs::Android,
        }
    }

    /// Where to download this module's sources for a Qt version.
    pub fn source(&self, version: &QtVersion) -> Result<SourceArchive, url::ParseError> {
        match self {
            Software::QtMqtt => {
                let dir_name = format!("qtmqtt-{}", version);
                Ok(SourceArchive {
                    url: github_archive("qt/qtmqtt", &format!("refs/tags/v{}", version))?,
                    file_name: format!("{}.tar.gz", dir_name),
                    dir_name,
                })
            }
            Software::QtConnectivity => {
                let branch = format!("blescanfiltering_v1_{}", version.compact());
                let dir_name = format!("qtconnectivity-{}", branch);
                Ok(SourceArchive {
                    url: github_archive(
                        "emericg/qtconnectivity",
                        &format!("refs/heads/{}", branch),
                    )?,
                    file_name: format!("{}.tar.gz", dir_name),
                    dir_name,
                })
            }
        }
    }
}

impl fmt::Display for Software {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Software {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "qtmqtt" => Ok(Software::QtMqtt),
            "qtconnectivity" => Ok(Software::QtConnectivity),
            other => Err(format!(
                "unknown software '{}'; expected one of: qtmqtt, qtconnectivity",
                other
            )),
        }
    }
}

/// OpenSSL builds packaged for android Qt applications.
pub fn android_openssl() -> Result<SourceArchive, url::ParseError> {
    Ok(SourceArchive {
        url: github_archive("KDAB/android_openssl", "master")?,
        file_name: "android_openssl-master.tar.gz".to_string(),
        dir_name: "android_openssl-master".to_string(),
    })
}

/// A single file download with no extraction step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDownload {
    pub url: Url,
    pub file_name: String,
}

/// linuxdeploy and the plugins needed to package linux AppImages.
pub fn linuxdeploy() -> Result<Vec<ToolDownload>, url::ParseError> {
    [
        ("linuxdeploy/linuxdeploy", "linuxdeploy-x86_64.AppImage"),
        (
            "linuxdeploy/linuxdeploy-plugin-appimage",
            "linuxdeploy-plugin-appimage-x86_64.AppImage",
        ),
        (
            "linuxdeploy/linuxdeploy-plugin-qt",
            "linuxdeploy-plugin-qt-x86_64.AppImage",
        ),
    ]
    .into_iter()
    .map(|(repo, file)| {
        let url = Url::parse("https://github.com/")?
            .join(&format!("{}/releases/download/continuous/{}", repo, file))?;
        Ok(ToolDownload {
            url,
            file_name: file.to_string(),
        })
    })
    .collect()
}

fn github_archive(repo: &str, reference: &str) -> Result<Url, url::ParseError> {
    Url::parse("https://github.com/")?.join(&format!("{}/archive/{}.tar.gz", repo, reference))
}
