use super::{PackPreview, SaleContract, ShareAmount};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use ethers::{
    abi::{decode, encode, parse_abi, Abi, ParamType, Token},
    providers::{Http, Middleware, Provider},
    types::{transaction::eip2718::TypedTransaction, Address, Bytes, TransactionRequest, U256},
    utils::id,
};
use rust_decimal::Decimal;
use std::{str::FromStr, time::Duration};
use tracing::debug;

/// 销售合约中本服务会读取的简单方法
const SALE_ABI: [&str; 3] = [
    "function tier() external view returns (string)",
    "function paused() external view returns (bool)",
    "function getMaxPacks(uint256 clubId) external view returns (uint256)",
];

/// `preview` 返回一个结构体，人类可读 ABI 无法表达，单独按 ParamType 解码
const PREVIEW_SIGNATURE: &str = "preview(uint256,uint256)";

/// `preview` 结构体中总价与卡包内容的字段位置
const PREVIEW_COST_INDEX: usize = 2;
const PREVIEW_SHARES_INDEX: usize = 4;

fn preview_output() -> ParamType {
    let share = ParamType::Tuple(vec![ParamType::Uint(256), ParamType::Uint(256)]);
    ParamType::Tuple(vec![
        ParamType::Uint(256),
        ParamType::Uint(256),
        ParamType::Uint(256), // cost
        ParamType::Uint(256),
        ParamType::Array(Box::new(share)), // shares
        ParamType::Array(Box::new(ParamType::Uint(256))),
    ])
}

/// 通过 JSON-RPC `eth_call` 读取销售合约
pub struct EvmSaleContract {
    provider: Provider<Http>,
    abi: Abi,
    timeout: Duration,
}

impl EvmSaleContract {
    pub fn new(rpc_url: &str, timeout: Duration) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| LedgerError::Config(format!("无法创建RPC连接 {}: {}", rpc_url, e)))?;
        let abi = parse_abi(&SALE_ABI).map_err(|e| LedgerError::Config(format!("销售合约ABI解析失败: {}", e)))?;

        Ok(Self { provider, abi, timeout })
    }

    async fn eth_call(&self, tier: &str, name: &str, data: Vec<u8>) -> Result<Bytes> {
        let address =
            Address::from_str(tier).map_err(|e| LedgerError::ExternalRead(format!("合约地址无效 {}: {}", tier, e)))?;

        let tx: TypedTransaction = TransactionRequest::new().to(address).data(data).into();
        let output = tokio::time::timeout(self.timeout, self.provider.call(&tx, None))
            .await
            .map_err(|_| LedgerError::ExternalRead(format!("{}.{} 调用超时", tier, name)))?
            .map_err(|e| LedgerError::ExternalRead(format!("{}.{} 调用失败: {}", tier, name, e)))?;

        debug!("📞 {}.{} 返回 {} 字节", tier, name, output.len());
        Ok(output)
    }

    async fn call(&self, tier: &str, name: &str, args: &[Token]) -> Result<Vec<Token>> {
        let function = self
            .abi
            .function(name)
            .map_err(|e| LedgerError::ExternalRead(format!("未知的合约方法 {}: {}", name, e)))?;
        let data = function
            .encode_input(args)
            .map_err(|e| LedgerError::ExternalRead(format!("{} 参数编码失败: {}", name, e)))?;

        let output = self.eth_call(tier, name, data).await?;

        function
            .decode_output(&output)
            .map_err(|e| LedgerError::ExternalRead(format!("{}.{} 返回值解码失败: {}", tier, name, e)))
    }

    async fn call_single(&self, tier: &str, name: &str, args: &[Token]) -> Result<Token> {
        self.call(tier, name, args)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LedgerError::ExternalRead(format!("{}.{} 没有返回值", tier, name)))
    }
}

fn club_arg(club_id: i32) -> Result<Token> {
    let id = u64::try_from(club_id).map_err(|_| LedgerError::ExternalRead(format!("俱乐部ID无效: {}", club_id)))?;
    Ok(Token::Uint(U256::from(id)))
}

fn uint_of(token: Token, what: &str) -> Result<U256> {
    token
        .into_uint()
        .ok_or_else(|| LedgerError::ExternalRead(format!("{} 不是整数", what)))
}

/// 合约里的计数都远小于 i32 上限，超出说明返回值异常
fn to_i32(value: U256, what: &str) -> Result<i32> {
    if value > U256::from(i32::MAX as u64) {
        return Err(LedgerError::ExternalRead(format!("{} 超出范围: {}", what, value)));
    }
    Ok(value.as_u32() as i32)
}

fn to_decimal(value: U256) -> Result<Decimal> {
    Decimal::from_str(&value.to_string())
        .map_err(|e| LedgerError::ExternalRead(format!("金额超出范围 {}: {}", value, e)))
}

fn decode_shares(token: Token) -> Result<Vec<ShareAmount>> {
    let entries = token
        .into_array()
        .ok_or_else(|| LedgerError::ExternalRead("卡包内容不是数组".to_string()))?;

    entries
        .into_iter()
        .map(|entry| {
            let mut fields = entry
                .into_tuple()
                .ok_or_else(|| LedgerError::ExternalRead("卡包内容项不是元组".to_string()))?
                .into_iter();
            let (Some(club), Some(num)) = (fields.next(), fields.next()) else {
                return Err(LedgerError::ExternalRead("卡包内容项字段不足".to_string()));
            };
            Ok(ShareAmount {
                club_id: to_i32(uint_of(club, "clubId")?, "clubId")?,
                num_shares: to_i32(uint_of(num, "numShares")?, "numShares")?,
            })
        })
        .collect()
}

#[async_trait]
impl SaleContract for EvmSaleContract {
    async fn tier_name(&self, tier: &str) -> Result<String> {
        self.call_single(tier, "tier", &[])
            .await?
            .into_string()
            .ok_or_else(|| LedgerError::ExternalRead(format!("{}.tier 不是字符串", tier)))
    }

    async fn is_paused(&self, tier: &str) -> Result<bool> {
        self.call_single(tier, "paused", &[])
            .await?
            .into_bool()
            .ok_or_else(|| LedgerError::ExternalRead(format!("{}.paused 不是布尔值", tier)))
    }

    async fn max_packs(&self, tier: &str, club_id: i32) -> Result<i32> {
        let value = uint_of(self.call_single(tier, "getMaxPacks", &[club_arg(club_id)?]).await?, "getMaxPacks")?;
        to_i32(value, "getMaxPacks")
    }

    async fn preview(&self, tier: &str, club_id: i32, quantity: i32) -> Result<PackPreview> {
        let mut data = id(PREVIEW_SIGNATURE).to_vec();
        data.extend(encode(&[club_arg(club_id)?, club_arg(quantity)?]));
        let output = self.eth_call(tier, "preview", data).await?;

        let mut fields = decode(&[preview_output()], &output)
            .map_err(|e| LedgerError::ExternalRead(format!("{}.preview 返回值解码失败: {}", tier, e)))?
            .into_iter()
            .next()
            .and_then(Token::into_tuple)
            .ok_or_else(|| LedgerError::ExternalRead(format!("{}.preview 返回值不是结构体", tier)))?;
        if fields.len() <= PREVIEW_SHARES_INDEX {
            return Err(LedgerError::ExternalRead(format!("{}.preview 返回值字段不足", tier)));
        }

        let shares = decode_shares(fields.swap_remove(PREVIEW_SHARES_INDEX))?;
        let cost = to_decimal(uint_of(fields.swap_remove(PREVIEW_COST_INDEX), "cost")?)?;

        Ok(PackPreview { cost, shares })
    }
}
