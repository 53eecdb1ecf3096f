mod dapp;
