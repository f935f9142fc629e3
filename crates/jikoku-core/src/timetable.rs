//! 時刻表の型定義

use serde::{Deserialize, Serialize};

/// 列車種別
///
/// スクレイピングサーバーは種別を文字列タグで返します。
/// 未知のタグは `Other` に保持され、表示上は区間快速として扱われます。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TrainType {
    Local,
    Rapid,
    RegionalRapid,
    Other(String),
}

impl From<String> for TrainType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "local" => TrainType::Local,
            "rapid" => TrainType::Rapid,
            "regional_rapid" => TrainType::RegionalRapid,
            _ => TrainType::Other(tag),
        }
    }
}

impl From<TrainType> for String {
    fn from(train_type: TrainType) -> Self {
        train_type.tag().to_string()
    }
}

impl TrainType {
    /// Wire tag as sent by the scraping server
    pub fn tag(&self) -> &str {
        match self {
            TrainType::Local => "local",
            TrainType::Rapid => "rapid",
            TrainType::RegionalRapid => "regional_rapid",
            TrainType::Other(tag) => tag.as_str(),
        }
    }

    /// テキスト返信用の種別名
    pub fn label(&self) -> &'static str {
        match self {
            TrainType::Local => "普通",
            TrainType::Rapid => "特急",
            TrainType::RegionalRapid | TrainType::Other(_) => "区間快速",
        }
    }
}

/// 時刻表の一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeTableEntry {
    /// [出発時刻, 到着時刻]
    pub time: [String; 2],
    #[serde(rename = "type")]
    pub train_type: TrainType,
    /// 0 = 直通, それ以外 = 乗換あり
    pub transfer: i64,
}

impl TimeTableEntry {
    pub fn new(departure: &str, arrival: &str, train_type: TrainType, transfer: i64) -> Self {
        Self {
            time: [departure.to_string(), arrival.to_string()],
            train_type,
            transfer,
        }
    }

    pub fn departure(&self) -> &str {
        &self.time[0]
    }

    pub fn arrival(&self) -> &str {
        &self.time[1]
    }

    pub fn requires_transfer(&self) -> bool {
        self.transfer != 0
    }
}

/// 時系列順 (サーバーの返却順) の時刻表
pub type TimeTable = Vec<TimeTableEntry>;
