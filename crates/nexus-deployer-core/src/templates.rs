//! Built-in contract templates.
//!
//! Templates are static data. Only `SimpleStorage` ships with bytecode; the
//! token and NFT templates get theirs from compiled Hardhat artifacts.

use alloy::json_abi::JsonAbi;
use alloy::primitives::Bytes;

use crate::domain::{ContractParameter, ContractTemplate, TemplateCategory};

/// Init code stores the trailing constructor word in slot 0 and returns a
/// runtime that answers `get()` and `set(uint256)`.
const SIMPLE_STORAGE_BYTECODE: &str = concat!(
    "0x602060203803600039600051600055603280601a6000396000f3",
    "60003560e01c806360fe47b114601d57636d4ce63c14602657600080fd",
    "5b5060043560005500",
    "5b60005460005260206000f3",
);

const SIMPLE_STORAGE_SOURCE: &str = r#"// SPDX-License-Identifier: MIT
pragma solidity ^0.8.19;

contract SimpleStorage {
    uint256 private storedData;

    constructor(uint256 _initialValue) {
        storedData = _initialValue;
    }

    function set(uint256 _value) public {
        storedData = _value;
    }

    function get() public view returns (uint256) {
        return storedData;
    }
}
"#;

const SIMPLE_STORAGE_ABI: &str = r#"[
  {"type":"constructor","stateMutability":"nonpayable","inputs":[{"name":"_initialValue","type":"uint256","internalType":"uint256"}]},
  {"type":"function","name":"set","stateMutability":"nonpayable","inputs":[{"name":"_value","type":"uint256","internalType":"uint256"}],"outputs":[]},
  {"type":"function","name":"get","stateMutability":"view","inputs":[],"outputs":[{"name":"","type":"uint256","internalType":"uint256"}]}
]"#;

const SIMPLE_TOKEN_SOURCE: &str = r#"// SPDX-License-Identifier: MIT
pragma solidity ^0.8.19;

contract SimpleToken {
    string public name;
    string public symbol;
    uint8 public decimals;
    uint256 public totalSupply;
    address public owner;

    mapping(address => uint256) public balanceOf;
    mapping(address => mapping(address => uint256)) public allowance;

    event Transfer(address indexed from, address indexed to, uint256 value);
    event Approval(address indexed owner, address indexed spender, uint256 value);

    modifier onlyOwner() {
        require(msg.sender == owner, "Only owner can call this function");
        _;
    }

    constructor(string memory _name, string memory _symbol, uint8 _decimals, uint256 _initialSupply) {
        name = _name;
        symbol = _symbol;
        decimals = _decimals;
        totalSupply = _initialSupply * 10**_decimals;
        owner = msg.sender;
        balanceOf[msg.sender] = totalSupply;
        emit Transfer(address(0), msg.sender, totalSupply);
    }

    function transfer(address _to, uint256 _value) public returns (bool) {
        require(_to != address(0), "Cannot transfer to zero address");
        require(balanceOf[msg.sender] >= _value, "Insufficient balance");
        balanceOf[msg.sender] -= _value;
        balanceOf[_to] += _value;
        emit Transfer(msg.sender, _to, _value);
        return true;
    }

    function approve(address _spender, uint256 _value) public returns (bool) {
        allowance[msg.sender][_spender] = _value;
        emit Approval(msg.sender, _spender, _value);
        return true;
    }

    function transferFrom(address _from, address _to, uint256 _value) public returns (bool) {
        require(_to != address(0), "Cannot transfer to zero address");
        require(balanceOf[_from] >= _value, "Insufficient balance");
        require(allowance[_from][msg.sender] >= _value, "Insufficient allowance");
        balanceOf[_from] -= _value;
        balanceOf[_to] += _value;
        allowance[_from][msg.sender] -= _value;
        emit Transfer(_from, _to, _value);
        return true;
    }

    function mint(address _to, uint256 _value) public onlyOwner {
        require(_to != address(0), "Cannot mint to zero address");
        totalSupply += _value;
        balanceOf[_to] += _value;
        emit Transfer(address(0), _to, _value);
    }

    function burn(uint256 _value) public {
        require(balanceOf[msg.sender] >= _value, "Insufficient balance to burn");
        balanceOf[msg.sender] -= _value;
        totalSupply -= _value;
        emit Transfer(msg.sender, address(0), _value);
    }
}
"#;

const SIMPLE_TOKEN_ABI: &str = r#"[
  {"type":"constructor","stateMutability":"nonpayable","inputs":[
    {"name":"_name","type":"string","internalType":"string"},
    {"name":"_symbol","type":"string","internalType":"string"},
    {"name":"_decimals","type":"uint8","internalType":"uint8"},
    {"name":"_initialSupply","type":"uint256","internalType":"uint256"}]},
  {"type":"function","name":"name","stateMutability":"view","inputs":[],"outputs":[{"name":"","type":"string","internalType":"string"}]},
  {"type":"function","name":"symbol","stateMutability":"view","inputs":[],"outputs":[{"name":"","type":"string","internalType":"string"}]},
  {"type":"function","name":"decimals","stateMutability":"view","inputs":[],"outputs":[{"name":"","type":"uint8","internalType":"uint8"}]},
  {"type":"function","name":"totalSupply","stateMutability":"view","inputs":[],"outputs":[{"name":"","type":"uint256","internalType":"uint256"}]},
  {"type":"function","name":"balanceOf","stateMutability":"view","inputs":[{"name":"","type":"address","internalType":"address"}],"outputs":[{"name":"","type":"uint256","internalType":"uint256"}]},
  {"type":"function","name":"transfer","stateMutability":"nonpayable","inputs":[{"name":"_to","type":"address","internalType":"address"},{"name":"_value","type":"uint256","internalType":"uint256"}],"outputs":[{"name":"","type":"bool","internalType":"bool"}]},
  {"type":"function","name":"approve","stateMutability":"nonpayable","inputs":[{"name":"_spender","type":"address","internalType":"address"},{"name":"_value","type":"uint256","internalType":"uint256"}],"outputs":[{"name":"","type":"bool","internalType":"bool"}]},
  {"type":"function","name":"transferFrom","stateMutability":"nonpayable","inputs":[{"name":"_from","type":"address","internalType":"address"},{"name":"_to","type":"address","internalType":"address"},{"name":"_value","type":"uint256","internalType":"uint256"}],"outputs":[{"name":"","type":"bool","internalType":"bool"}]},
  {"type":"function","name":"mint","stateMutability":"nonpayable","inputs":[{"name":"_to","type":"address","internalType":"address"},{"name":"_value","type":"uint256","internalType":"uint256"}],"outputs":[]},
  {"type":"function","name":"burn","stateMutability":"nonpayable","inputs":[{"name":"_value","type":"uint256","internalType":"uint256"}],"outputs":[]}
]"#;

const SIMPLE_NFT_SOURCE: &str = r#"// SPDX-License-Identifier: MIT
pragma solidity ^0.8.19;

contract SimpleNFT {
    string public name;
    string public symbol;
    uint256 public totalSupply;
    address public owner;

    mapping(uint256 => address) public ownerOf;
    mapping(address => uint256) public balanceOf;
    mapping(uint256 => address) public getApproved;
    mapping(address => mapping(address => bool)) public isApprovedForAll;
    mapping(uint256 => string) public tokenURI;

    event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
    event Approval(address indexed owner, address indexed approved, uint256 indexed tokenId);
    event ApprovalForAll(address indexed owner, address indexed operator, bool approved);

    modifier onlyOwner() {
        require(msg.sender == owner, "Only owner can call this function");
        _;
    }

    constructor(string memory _name, string memory _symbol) {
        name = _name;
        symbol = _symbol;
        owner = msg.sender;
    }

    function mint(address _to, uint256 _tokenId, string memory _tokenURI) public onlyOwner {
        require(_to != address(0), "Cannot mint to zero address");
        require(ownerOf[_tokenId] == address(0), "Token already exists");
        ownerOf[_tokenId] = _to;
        balanceOf[_to] += 1;
        totalSupply += 1;
        tokenURI[_tokenId] = _tokenURI;
        emit Transfer(address(0), _to, _tokenId);
    }

    function approve(address _approved, uint256 _tokenId) public {
        require(ownerOf[_tokenId] == msg.sender, "Not the owner of this token");
        getApproved[_tokenId] = _approved;
        emit Approval(msg.sender, _approved, _tokenId);
    }

    function setApprovalForAll(address _operator, bool _approved) public {
        isApprovedForAll[msg.sender][_operator] = _approved;
        emit ApprovalForAll(msg.sender, _operator, _approved);
    }

    function transferFrom(address _from, address _to, uint256 _tokenId) public {
        require(_to != address(0), "Cannot transfer to zero address");
        require(ownerOf[_tokenId] == _from, "From address is not the owner");
        require(
            msg.sender == _from ||
            getApproved[_tokenId] == msg.sender ||
            isApprovedForAll[_from][msg.sender],
            "Not approved to transfer this token"
        );
        ownerOf[_tokenId] = _to;
        balanceOf[_from] -= 1;
        balanceOf[_to] += 1;
        getApproved[_tokenId] = address(0);
        emit Transfer(_from, _to, _tokenId);
    }
}
"#;

const SIMPLE_NFT_ABI: &str = r#"[
  {"type":"constructor","stateMutability":"nonpayable","inputs":[
    {"name":"_name","type":"string","internalType":"string"},
    {"name":"_symbol","type":"string","internalType":"string"}]},
  {"type":"function","name":"name","stateMutability":"view","inputs":[],"outputs":[{"name":"","type":"string","internalType":"string"}]},
  {"type":"function","name":"symbol","stateMutability":"view","inputs":[],"outputs":[{"name":"","type":"string","internalType":"string"}]},
  {"type":"function","name":"totalSupply","stateMutability":"view","inputs":[],"outputs":[{"name":"","type":"uint256","internalType":"uint256"}]},
  {"type":"function","name":"ownerOf","stateMutability":"view","inputs":[{"name":"","type":"uint256","internalType":"uint256"}],"outputs":[{"name":"","type":"address","internalType":"address"}]},
  {"type":"function","name":"balanceOf","stateMutability":"view","inputs":[{"name":"","type":"address","internalType":"address"}],"outputs":[{"name":"","type":"uint256","internalType":"uint256"}]},
  {"type":"function","name":"mint","stateMutability":"nonpayable","inputs":[{"name":"_to","type":"address","internalType":"address"},{"name":"_tokenId","type":"uint256","internalType":"uint256"},{"name":"_tokenURI","type":"string","internalType":"string"}],"outputs":[]},
  {"type":"function","name":"approve","stateMutability":"nonpayable","inputs":[{"name":"_approved","type":"address","internalType":"address"},{"name":"_tokenId","type":"uint256","internalType":"uint256"}],"outputs":[]},
  {"type":"function","name":"setApprovalForAll","stateMutability":"nonpayable","inputs":[{"name":"_operator","type":"address","internalType":"address"},{"name":"_approved","type":"bool","internalType":"bool"}],"outputs":[]},
  {"type":"function","name":"transferFrom","stateMutability":"nonpayable","inputs":[{"name":"_from","type":"address","internalType":"address"},{"name":"_to","type":"address","internalType":"address"},{"name":"_tokenId","type":"uint256","internalType":"uint256"}],"outputs":[]}
]"#;

#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: Vec<ContractTemplate>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateRegistry {
    pub fn builtin() -> Self {
        Self {
            templates: vec![simple_storage(), simple_token(), simple_nft()],
        }
    }

    pub fn get(&self, id: &str) -> Option<&ContractTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContractTemplate> {
        self.templates.iter()
    }

    pub fn by_category(
        &self,
        category: TemplateCategory,
    ) -> impl Iterator<Item = &ContractTemplate> {
        self.templates.iter().filter(move |t| t.category == category)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Attaches compiled output to the template whose Solidity contract is
    /// `artifact_name`. Returns `false` when no template matches.
    pub fn attach_artifact(
        &mut self,
        artifact_name: &str,
        bytecode: Bytes,
        abi: Option<JsonAbi>,
    ) -> bool {
        let Some(template) = self
            .templates
            .iter_mut()
            .find(|t| t.artifact_name == artifact_name)
        else {
            return false;
        };
        template.bytecode = Some(bytecode);
        if let Some(abi) = abi {
            template.abi = abi;
        }
        true
    }
}

fn param(
    name: &str,
    kind: &str,
    description: &str,
    default_value: &str,
    max_len: Option<usize>,
) -> ContractParameter {
    ContractParameter {
        name: name.to_owned(),
        kind: kind.parse().expect("valid built-in parameter type"),
        description: description.to_owned(),
        required: true,
        default_value: Some(default_value.to_owned()),
        max_len,
    }
}

fn abi(json: &str) -> JsonAbi {
    serde_json::from_str(json).expect("valid built-in abi")
}

fn simple_storage() -> ContractTemplate {
    ContractTemplate {
        id: "simple-storage".to_owned(),
        name: "Simple Storage".to_owned(),
        description: "A basic smart contract for storing and retrieving a value".to_owned(),
        category: TemplateCategory::Storage,
        artifact_name: "SimpleStorage".to_owned(),
        parameters: vec![param(
            "initialValue",
            "uint256",
            "Initial value to store in the contract",
            "42",
            None,
        )],
        source_code: SIMPLE_STORAGE_SOURCE.to_owned(),
        abi: abi(SIMPLE_STORAGE_ABI),
        bytecode: Some(
            SIMPLE_STORAGE_BYTECODE
                .parse()
                .expect("valid built-in bytecode"),
        ),
    }
}

fn simple_token() -> ContractTemplate {
    ContractTemplate {
        id: "simple-token".to_owned(),
        name: "ERC-20 Token".to_owned(),
        description: "A standard ERC-20 token contract with mint and burn functionality"
            .to_owned(),
        category: TemplateCategory::Token,
        artifact_name: "SimpleToken".to_owned(),
        parameters: vec![
            param("name", "string", "Token name (e.g., \"My Token\")", "MyToken", Some(30)),
            param("symbol", "string", "Token symbol (e.g., \"MTK\")", "MTK", Some(10)),
            param(
                "decimals",
                "uint8",
                "Number of decimal places (usually 18)",
                "18",
                None,
            ),
            param(
                "initialSupply",
                "uint256",
                "Initial token supply (without decimals)",
                "1000000",
                None,
            ),
        ],
        source_code: SIMPLE_TOKEN_SOURCE.to_owned(),
        abi: abi(SIMPLE_TOKEN_ABI),
        bytecode: None,
    }
}

fn simple_nft() -> ContractTemplate {
    ContractTemplate {
        id: "simple-nft".to_owned(),
        name: "NFT Collection".to_owned(),
        description:
            "A simple NFT contract for creating digital collectibles with metadata support"
                .to_owned(),
        category: TemplateCategory::Nft,
        artifact_name: "SimpleNFT".to_owned(),
        parameters: vec![
            param(
                "name",
                "string",
                "NFT collection name (e.g., \"My NFT Collection\")",
                "MyNFT",
                Some(30),
            ),
            param(
                "symbol",
                "string",
                "NFT collection symbol (e.g., \"MNFT\")",
                "MNFT",
                Some(10),
            ),
        ],
        source_code: SIMPLE_NFT_SOURCE.to_owned(),
        abi: abi(SIMPLE_NFT_ABI),
        bytecode: None,
    }
}
