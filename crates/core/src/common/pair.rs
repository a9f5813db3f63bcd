use crate::market::error::MarketError;

/// 以比特币计价的交易对前缀。
pub const BTC: &str = "BTC";

/// 去掉分隔符并统一为大写，例如 `"eth-btc"` -> `"ETHBTC"`。
pub fn clean_symbol(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// 交易对是否以 BTC 开头（价格无需取倒数）。
pub fn is_btc_based(raw: &str) -> bool {
    clean_symbol(raw).starts_with(BTC)
}

/// # Summary
/// 将交易所原始交易对归一化为 `"BASE-QUOTE"`。
///
/// # Logic
/// 1. 去掉非字母数字字符并转为大写。
/// 2. 以 BTC 开头：前 3 位为 BASE，其余为 QUOTE。
/// 3. 否则：末 3 位为新的 BASE，其余部分放在连字符之后。非 BTC 开头的交易对
///    价格会被取倒数，因此 `"ETHBTC"` 归一化后表示每个 BTC 值多少 ETH，即 `"BTC-ETH"`。
///
/// # Returns
/// 成功返回归一化后的交易对；长度不足 4 位时返回 `MarketError::Protocol`。
pub fn normalize_pair(raw: &str) -> Result<String, MarketError> {
    let cleaned = clean_symbol(raw);
    if cleaned.len() < 4 {
        return Err(MarketError::Protocol(format!(
            "Trading pair too short: {:?}",
            raw
        )));
    }

    // cleaned 只含 ASCII，按字节切分是安全的
    if cleaned.starts_with(BTC) {
        let (base, quote) = cleaned.split_at(3);
        Ok(format!("{}-{}", base, quote))
    } else {
        let (rest, last3) = cleaned.split_at(cleaned.len() - 3);
        Ok(format!("{}-{}", last3, rest))
    }
}
